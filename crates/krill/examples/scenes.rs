//! Scene flow — a minimal application driven by the state machine.
//!
//! Demonstrates:
//!   1. A common region holding the registry shared by every scene
//!   2. A loading scene that populates the world, then switches
//!   3. A simulation scene stepping a view each frame
//!   4. A pause scene entered with caching, so resuming restores the
//!      running simulation instance
//!
//! Run with:
//!   cargo run --example scenes

use std::cell::RefCell;
use std::rc::Rc;

use krill::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum SceneKey {
    Loading,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy)]
struct Heat {
    degrees: f64,
}

#[derive(Debug, Clone, Copy)]
struct Cooling {
    rate: f64,
}

/// Shared by every scene: the registry plus a frame budget.
struct World {
    registry: Registry,
    frames_left: u32,
}

struct Loading;

impl State<SceneKey, World> for Loading {
    fn init(&mut self, common: &Rc<RefCell<World>>) {
        let mut world = common.borrow_mut();
        for i in 0..6 {
            let e = world.registry.create();
            world.registry.add(e, Heat { degrees: 100.0 });
            if i % 2 == 0 {
                world.registry.add(e, Cooling { rate: 2.5 });
            }
        }
        println!(
            "[loading] spawned {} entities ({} cooling)",
            world.registry.count::<Heat>(),
            world.registry.count::<Cooling>()
        );
    }

    fn update(&mut self, _common: &Rc<RefCell<World>>) -> Transition<SceneKey> {
        Transition::Switch(SceneKey::Running)
    }
}

struct Running {
    steps: u32,
}

impl State<SceneKey, World> for Running {
    fn init(&mut self, _common: &Rc<RefCell<World>>) {
        println!("[running] entering at step {}", self.steps);
    }

    fn update(&mut self, common: &Rc<RefCell<World>>) -> Transition<SceneKey> {
        let mut world = common.borrow_mut();
        self.steps += 1;

        world.registry.view::<(Heat, Cooling)>().each(|heat, cooling| {
            heat.degrees -= cooling.rate;
        });

        let mut hottest = f64::MIN;
        world.registry.each::<Heat>(|h| hottest = hottest.max(h.degrees));
        println!("[running] step {}, hottest {hottest:.1}", self.steps);

        world.frames_left -= 1;
        if world.frames_left == 0 {
            Transition::Exit
        } else if self.steps == 3 {
            // Cache this scene so resuming keeps the step counter.
            Transition::SwitchCaching(SceneKey::Paused)
        } else {
            Transition::Stay
        }
    }
}

struct Paused {
    held_frames: u32,
}

impl State<SceneKey, World> for Paused {
    fn init(&mut self, _common: &Rc<RefCell<World>>) {
        println!("[paused]");
    }

    fn update(&mut self, common: &Rc<RefCell<World>>) -> Transition<SceneKey> {
        let mut world = common.borrow_mut();
        world.frames_left -= 1;
        self.held_frames += 1;
        if self.held_frames == 2 {
            // Switching back to Running restores the cached instance.
            Transition::Switch(SceneKey::Running)
        } else {
            Transition::Stay
        }
    }
}

fn main() {
    let mut app = App::new(World {
        registry: Registry::new(),
        frames_left: 10,
    });
    app.add_state(SceneKey::Loading, || Loading);
    app.add_state(SceneKey::Running, || Running { steps: 0 });
    app.add_state(SceneKey::Paused, || Paused { held_frames: 0 });

    app.init(Some(SceneKey::Loading));
    while !app.finished() {
        app.update();
    }

    let world = app.common().borrow();
    let registry = &world.registry;
    let mut final_cooled = Vec::new();
    if let Some(pool) = registry.pool::<Cooling>() {
        for &e in pool.entities() {
            if let Some(heat) = registry.get::<Heat>(e) {
                final_cooled.push(heat.degrees);
            }
        }
    }
    println!("final cooled temperatures: {final_cooled:?}");
}

use archetype_ecs::prelude::*;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}
#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

struct Tick(u32);

#[test]
fn scheduler_runs_systems_in_order_against_resources() {
    let registry = TypeRegistryBuilder::new()
        .register::<Position>()
        .register::<Velocity>()
        .build();
    let mut world: World<Tick> = World::new(registry, Tick(0));
    world
        .spawn((Position { x: 0.0, y: 0.0 }, Velocity { x: 1.0, y: 2.0 }))
        .unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));

    let mut scheduler = Scheduler::new();
    scheduler.add_system({
        let order = order.clone();
        move |world: &mut World<Tick>| {
            order.lock().unwrap().push("movement");
            let position_bit = world.registry().bit::<Position>().unwrap();
            let velocity_bit = world.registry().bit::<Velocity>().unwrap();
            let moving: Vec<_> = world.entities(position_bit | velocity_bit, 0);
            for entity in moving {
                let velocity = *world.get::<Velocity>(entity).unwrap();
                let position = world.get_mut::<Position>(entity).unwrap();
                position.x += velocity.x;
                position.y += velocity.y;
            }
            Ok(())
        }
    });
    scheduler.add_system({
        let order = order.clone();
        move |world: &mut World<Tick>| {
            order.lock().unwrap().push("tick");
            world.resources_mut().0 += 1;
            Ok(())
        }
    });

    scheduler.run(&mut world).unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["movement", "tick"]);
    assert_eq!(world.resources().0, 1);
}

#[test]
fn scheduler_stops_at_first_failing_system() {
    let registry = TypeRegistryBuilder::new().register::<Position>().build();
    let mut world: World<()> = World::new(registry, ());

    let mut scheduler = Scheduler::new();
    scheduler.add_system(|_w: &mut World<()>| Err(EcsError::AllocationFailed));
    let ran_second = Arc::new(Mutex::new(false));
    scheduler.add_system({
        let ran_second = ran_second.clone();
        move |_w: &mut World<()>| {
            *ran_second.lock().unwrap() = true;
            Ok(())
        }
    });

    let err = scheduler.run(&mut world).unwrap_err();
    assert!(matches!(err, EcsError::System(0, _)));
    assert!(!*ran_second.lock().unwrap());
}

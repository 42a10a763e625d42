use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use component_registry::registry::{
    ancestors, ComponentDefinition, ComponentLookup, HierarchicalLookup, Registry,
    RegistrySettings,
};

struct Expensive {
    serial: usize,
}

#[test]
fn concurrent_first_access_builds_one_singleton() {
    let registry = Registry::new(RegistrySettings::named("threads")).unwrap();
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    registry
        .register_definition(ComponentDefinition::of("expensive", move |_, _| {
            let serial = counter.fetch_add(1, Ordering::SeqCst);
            thread::yield_now();
            Ok(Expensive { serial })
        }))
        .unwrap();

    let barrier = Arc::new(Barrier::new(16));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.get_instance("expensive").unwrap()
            })
        })
        .collect();
    let instances: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    let first = &instances[0];
    assert!(instances.iter().all(|other| Arc::ptr_eq(first, other)));
    let expensive = first.clone().downcast::<Expensive>().unwrap();
    assert_eq!(expensive.serial, 0);
}

#[test]
fn listings_run_while_other_threads_build() {
    let root = Registry::new(RegistrySettings::named("root")).unwrap();
    for index in 0..32 {
        root.register_definition(ComponentDefinition::of(format!("c{index}"), move |_, _| {
            thread::yield_now();
            Ok(index)
        }))
        .unwrap();
    }
    let child = root.new_child(RegistrySettings::named("child")).unwrap();

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let child = child.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                if worker % 2 == 0 {
                    for index in 0..32 {
                        child.get_instance(&format!("c{index}")).unwrap();
                    }
                }
                ancestors::names_including_ancestors(&child).len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 32);
    }
    assert_eq!(root.singletons().count(), 32);
}

#[test]
fn registries_racing_to_adopt_each_other_never_form_a_cycle() {
    for _ in 0..64 {
        let a = Registry::new(RegistrySettings::named("a")).unwrap();
        let b = Registry::new(RegistrySettings::named("b")).unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [(a.clone(), b.clone()), (b.clone(), a.clone())]
            .into_iter()
            .map(|(child, parent)| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    child.set_parent(Arc::new(parent)).is_ok()
                })
            })
            .collect();
        let linked = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(linked, 1);
        assert!(a.parent().is_some() != b.parent().is_some());
        assert_eq!(ancestors::count_including_ancestors(&a), 0);
    }
}

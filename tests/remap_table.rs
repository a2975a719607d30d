// RemapTable integration tests: a cloning pass over a cyclic object graph.
//
// The pass records old → new for each copied node, then uses the table to
// rewire edges so shared and cyclic structure is reproduced once.
use ptr_table::{Addr, PtrTable, Remap, RemapTable};
use std::cell::RefCell;
use std::rc::Rc;

struct Node {
    label: String,
    edges: Vec<Rc<RefCell<Node>>>,
}

type NodeRef = Rc<RefCell<Node>>;

fn node(label: &str) -> NodeRef {
    Rc::new(RefCell::new(Node {
        label: label.to_string(),
        edges: Vec::new(),
    }))
}

fn link(from: &NodeRef, to: &NodeRef) {
    from.borrow_mut().edges.push(to.clone());
}

fn deep_clone(n: &NodeRef, seen: &mut PtrTable<*const RefCell<Node>, NodeRef>) -> NodeRef {
    if let Some(copy) = seen.fetch(Rc::as_ptr(n)) {
        return copy.clone();
    }
    let copy = node(&n.borrow().label);
    seen.store(Rc::as_ptr(n), copy.clone());
    let edges: Vec<NodeRef> = n.borrow().edges.clone();
    for e in &edges {
        let c = deep_clone(e, seen);
        copy.borrow_mut().edges.push(c);
    }
    copy
}

fn unlink_all(nodes: &[NodeRef]) {
    for n in nodes {
        n.borrow_mut().edges.clear();
    }
}

// Test: cyclic graph a → b → c → a with a shared edge a → c.
// Verifies: each original is copied exactly once, copies are distinct from
// originals, and the copy reproduces the cycle and the sharing.
#[test]
fn clone_cyclic_graph_once_per_node() {
    let a = node("a");
    let b = node("b");
    let c = node("c");
    link(&a, &b);
    link(&b, &c);
    link(&c, &a);
    link(&a, &c);

    let mut seen = PtrTable::new();
    let a2 = deep_clone(&a, &mut seen);
    assert_eq!(seen.len(), 3);

    assert!(!Rc::ptr_eq(&a, &a2));
    let b2 = a2.borrow().edges[0].clone();
    let c2 = b2.borrow().edges[0].clone();
    assert_eq!(b2.borrow().label, "b");
    assert_eq!(c2.borrow().label, "c");
    // cycle closes on the copy, not the original
    assert!(Rc::ptr_eq(&c2.borrow().edges[0], &a2));
    // shared target copied once
    assert!(Rc::ptr_eq(&a2.borrow().edges[1], &c2));
    assert!(Rc::ptr_eq(seen.fetch(Rc::as_ptr(&c)).unwrap(), &c2));

    let copies: Vec<NodeRef> = seen.iter().map(|(_, v)| v.clone()).collect();
    let mut slot = Some(seen);
    PtrTable::destroy(&mut slot);
    unlink_all(&[a, b, c]);
    unlink_all(&copies);
}

// Test: address-level remap for an arena copy.
// Verifies: references inside the copied arena are rewritten through the
// old → new table, and every correspondence is listed once.
#[test]
fn arena_copy_rewrites_references() {
    // Each slot refers to another slot by address.
    let old: Vec<Box<u64>> = (0..1000u64).map(Box::new).collect();
    let refs: Vec<Addr> = (0..1000).map(|i| Addr::of(&*old[(i * 31) % 1000])).collect();

    let new: Vec<Box<u64>> = old.iter().map(|b| Box::new(**b)).collect();
    let mut remap: RemapTable<Addr> = RemapTable::new();
    for (o, n) in old.iter().zip(&new) {
        remap.store(Addr::of(&**o), Addr::of(&**n));
    }
    assert_eq!(remap.len(), 1000);
    assert!(remap.capacity() > 512);

    let rewritten: Vec<Addr> = refs
        .iter()
        .map(|r| remap.fetch(*r).expect("every referent was copied"))
        .collect();
    for (i, r) in rewritten.iter().enumerate() {
        assert_eq!(*r, Addr::of(&*new[(i * 31) % 1000]));
    }

    let pairs: Vec<Remap<Addr>> = remap.iter().collect();
    assert_eq!(pairs.len(), 1000);
    assert!(pairs.iter().all(|p| remap.fetch(p.oldval) == Some(p.newval)));

    // A fresh allocation was never copied.
    let stray = Box::new(0u64);
    assert_eq!(remap.fetch(Addr::of(&*stray)), None);

    let mut slot = Some(remap);
    RemapTable::destroy(&mut slot);
    RemapTable::destroy(&mut slot);
    assert!(slot.is_none());
}

// Test: two partial passes merged.
// Verifies: absorb unions the correspondences.
#[test]
fn partial_passes_merge() {
    let mut first: RemapTable<Addr> = RemapTable::new();
    let mut second: RemapTable<Addr> = RemapTable::new();
    for i in 0..100usize {
        first.store(Addr::new(i * 8), Addr::new(0x1_0000 + i * 8));
        second.store(Addr::new(0x8000 + i * 8), Addr::new(0x2_0000 + i * 8));
    }
    first.absorb(second);
    assert_eq!(first.len(), 200);
    assert_eq!(first.fetch(Addr::new(0x8000)), Some(Addr::new(0x2_0000)));
    assert_eq!(first.fetch(Addr::new(8)), Some(Addr::new(0x1_0008)));
}

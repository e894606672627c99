//! Paceline Example Suite
//!
//! Registers a handful of benchmarks and hands control to the Paceline CLI.
//!
//! Run with:
//!   cargo run --example suite -- list                      # List registered benchmarks
//!   cargo run --example suite -- run demos/suite.toml      # Run the demo suite file
//!   cargo run --example suite -- run demos/suite.toml --format json --output report.json

use paceline::prelude::*;
use std::collections::HashMap;
use std::hint::black_box;

// ============================================================================
// Collections
// ============================================================================

paceline::register!("vec-push", || {
    Benchmark::new("vec-push", || {
        let mut v = Vec::new();
        for i in 0..256u32 {
            v.push(black_box(i));
        }
        v
    })
});

paceline::register!("vec-with-capacity", || {
    Benchmark::new("vec-with-capacity", || {
        let mut v = Vec::with_capacity(256);
        for i in 0..256u32 {
            v.push(black_box(i));
        }
        v
    })
});

paceline::register!("hashmap-insert", || {
    Benchmark::new("hashmap-insert", || {
        let mut map = HashMap::with_capacity(64);
        for i in 0..64u64 {
            map.insert(black_box(i), i * 2);
        }
        map
    })
});

// ============================================================================
// Setup and Teardown
// ============================================================================

paceline::register!("sort-unstable", || {
    use std::sync::{Arc, Mutex};

    let data = Arc::new(Mutex::new(Vec::<u64>::new()));
    let fill = data.clone();
    Benchmark::new("sort-unstable", move || {
        if let Ok(mut v) = data.lock() {
            v.sort_unstable();
        }
    })
    .with_setup(move || {
        if let Ok(mut v) = fill.lock() {
            v.clear();
            v.extend((0..1024u64).rev());
        }
    })
});

// ============================================================================
// Deferred
// ============================================================================

paceline::register!("thread-handoff", || {
    Benchmark::deferred("thread-handoff", |deferred: Deferred| {
        std::thread::spawn(move || deferred.resolve());
    })
});

// ============================================================================
// Failure Isolation
// ============================================================================

paceline::register!("always-panics", || {
    Benchmark::new("always-panics", || -> u64 { panic!("intentional failure") })
});

fn main() {
    // All benchmarks registered above are discovered via inventory
    if let Err(e) = paceline::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

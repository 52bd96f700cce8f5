//! Observing and gating parameter access with callbacks.

use cfg_broker::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let broker = Broker::new();
    let rate = broker.create_param("producer.rate", 5i64).build()?;

    // Observers see every read and committed write.
    rate.on_post_read(|e| println!("read {} -> {}", e.name, e.value));
    rate.on_post_write(|e| {
        println!(
            "write {}: {} -> {} (by {})",
            e.name, e.old_value, e.new_value, e.originator
        )
    });

    // A veto gate keeps the value in range.
    rate.on_pre_write(|e| (1..=100).contains(&e.new_value));

    let _ = rate.get_value();
    assert!(rate.set_value_by(42, Originator::new("operator")));
    assert!(!rate.set_value_by(1000, Originator::new("operator")));
    println!("final value: {}", rate.get_value());

    Ok(())
}

use aether_sandbox::{AetherDB, Document, Suite, SuiteConfig, run_on_new_thread};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let suite = Suite::set_up(SuiteConfig::from_env());

    let clean = suite.run_test("-[playground testClean]", |sandbox| {
        let db = AetherDB::open(&sandbox.config())?;
        db.create_collection("abcde", 3, "l2")?;
        db.upsert("abcde", Document::new(vec![0.1, 0.2, 0.3], "hello".to_string()))?;

        let handover = db.handover()?;
        run_on_new_thread(move |_| match handover.resolve() {
            Ok(remote) => {
                println!("worker sees {:?}", remote.collection_names());
                remote.close();
            }
            Err(err) => println!("worker could not open: {}", err),
        });

        db.close();
        Ok::<(), aether_sandbox::DatabaseError>(())
    });
    println!("clean: {:?}", clean);

    let leaky = suite.run_test("-[playground testLeak]", |sandbox| {
        let db = AetherDB::open(&sandbox.config())?;
        std::mem::forget(db);
        Ok::<(), aether_sandbox::DatabaseError>(())
    });
    println!("leaky: {:?}", leaky);

    suite.tear_down();
}

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::panic;
use std::thread;
use tracing::debug;

type Task<'env> = Box<dyn FnOnce(&WorkerQueue<'env>) + Send + 'env>;

/// The task queue of the worker started by [`run_on_new_thread`].
///
/// Only reachable from tasks running on that worker.
pub struct WorkerQueue<'env> {
    sender: Sender<Task<'env>>,
}

impl<'env> WorkerQueue<'env> {
    /// Queues `task` to run on this worker after the current task returns.
    pub fn dispatch(&self, task: impl FnOnce(&WorkerQueue<'env>) + Send + 'env) {
        // the receiver lives until the queue is drained, so this cannot fail
        let _ = self.sender.send(Box::new(task));
    }
}

/// Runs `block` on a fresh thread and waits until that thread's queue is empty,
/// including anything `block` dispatches onto it. A panic on the worker is
/// resumed on the caller.
pub fn run_on_new_thread<'env, F>(block: F)
where
    F: FnOnce(&WorkerQueue<'env>) + Send + 'env,
{
    let (sender, receiver): (Sender<Task<'env>>, Receiver<Task<'env>>) = unbounded();
    let queue = WorkerQueue { sender };
    queue.dispatch(block);

    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("sandbox-worker".to_string())
            .spawn_scoped(scope, move || {
                let mut drained = 0usize;
                while let Ok(task) = receiver.try_recv() {
                    task(&queue);
                    drained += 1;
                }
                debug!(tasks = drained, "worker queue drained");
            });

        match worker {
            Ok(handle) => {
                if let Err(payload) = handle.join() {
                    panic::resume_unwind(payload);
                }
            }
            Err(err) => panic!("failed to spawn sandbox worker: {}", err),
        }
    });
}

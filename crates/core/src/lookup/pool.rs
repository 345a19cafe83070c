use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io;
use std::thread;
use tracing::{debug, trace};

/// Unit of work handed to a pool; the job wrapper has already attached bookkeeping
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// Execution strategy for lookup jobs.
///
/// Clones share the same queue; the workers exit once every clone is dropped.
#[derive(Clone)]
pub(crate) enum WorkerPool {
    /// Run each task on the caller's thread before `execute` returns
    Inline,
    /// Queue tasks to a fixed set of worker threads
    Threaded(ThreadedPool),
}

impl WorkerPool {
    pub fn inline() -> Self {
        WorkerPool::Inline
    }

    pub fn threaded(size: usize) -> io::Result<Self> {
        ThreadedPool::new(size).map(WorkerPool::Threaded)
    }

    /// Run or enqueue `task`. Never waits for a queued task to finish.
    pub fn execute(&self, task: Task) {
        match self {
            WorkerPool::Inline => task(),
            WorkerPool::Threaded(pool) => pool.submit(task),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            WorkerPool::Inline => 1,
            WorkerPool::Threaded(pool) => pool.size,
        }
    }
}

/// FIFO queue drained by `size` detached worker threads.
///
/// Workers exit once the last clone of the pool (and with it the last sender)
/// is dropped and the queue is empty. The pool never joins its workers: it may
/// be dropped from one of them.
#[derive(Clone)]
pub(crate) struct ThreadedPool {
    sender: Sender<Task>,
    size: usize,
}

impl ThreadedPool {
    pub fn new(size: usize) -> io::Result<Self> {
        let (sender, receiver) = unbounded::<Task>();
        for index in 0..size {
            let receiver = receiver.clone();
            thread::Builder::new()
                .name(format!("lookup-worker-{}", index))
                .spawn(move || worker_loop(index, receiver))?;
        }
        debug!("Started lookup pool with {} workers", size);
        Ok(Self { sender, size })
    }

    fn submit(&self, task: Task) {
        if let Err(rejected) = self.sender.send(task) {
            // All workers are gone; running inline keeps the job bookkeeping balanced
            (rejected.into_inner())();
        }
    }
}

fn worker_loop(index: usize, receiver: Receiver<Task>) {
    while let Ok(task) = receiver.recv() {
        task();
    }
    trace!("Lookup worker {} exiting", index);
}

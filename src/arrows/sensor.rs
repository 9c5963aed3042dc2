//! Sensors: arrows with no input that push readings of an external value
//!
//! A passive sensor pushes one reading per call to `measure`. An active
//! sensor runs on the Tokio runtime and pushes a reading every interval until
//! it is stopped.

use super::{ArrowError, ArrowResult, Emitter, Receiver};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pushes a reading each time it is asked to
pub struct PassiveSensor<T> {
    read: Box<dyn Fn() -> T + Send + Sync>,
    emitter: Emitter<T>,
}

impl<T: Clone> PassiveSensor<T> {
    pub fn new(read: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            read: Box::new(read),
            emitter: Emitter::new(),
        }
    }

    /// Read the value, push it to subscribers and return it
    pub fn measure(&self) -> T {
        let value = (self.read)();
        self.emitter.emit(value.clone());
        value
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver<T>>) {
        self.emitter.subscribe(receiver);
    }

    pub fn emitter(&self) -> &Emitter<T> {
        &self.emitter
    }
}

/// Pushes a reading every `interval` from a background task
pub struct ActiveSensor<T> {
    read: Arc<dyn Fn() -> T + Send + Sync>,
    emitter: Arc<Emitter<T>>,
    interval: Duration,
    tasks: Mutex<SensorTasks>,
}

/// Each run gets its own flag; a stopped loop never sees a later start
#[derive(Default)]
struct SensorTasks {
    running: Option<Arc<AtomicBool>>,
    handles: Vec<JoinHandle<()>>,
}

impl SensorTasks {
    fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    fn stop(&mut self) -> bool {
        self.running
            .take()
            .is_some_and(|flag| flag.swap(false, Ordering::AcqRel))
    }
}

impl<T: Clone + Send + 'static> ActiveSensor<T> {
    pub fn new(interval: Duration, read: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            read: Arc::new(read),
            emitter: Arc::new(Emitter::new()),
            interval,
            tasks: Mutex::new(SensorTasks::default()),
        }
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver<T>>) {
        self.emitter.subscribe(receiver);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.tasks.lock().is_running()
    }

    /// Spawn the measuring task on the current Tokio runtime
    ///
    /// The first reading is pushed immediately, then one per interval.
    pub fn start(&self) -> ArrowResult<()> {
        let handle = Handle::try_current().map_err(|_| ArrowError::NoRuntime)?;

        let mut tasks = self.tasks.lock();
        if tasks.is_running() {
            warn!("Active sensor start requested while already running");
            return Err(ArrowError::AlreadyRunning);
        }

        let read = Arc::clone(&self.read);
        let emitter = Arc::clone(&self.emitter);
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let interval = self.interval;

        info!("Starting active sensor with interval {:?}", interval);
        let task = handle.spawn(async move {
            while flag.load(Ordering::Acquire) {
                emitter.emit(read());
                tokio::time::sleep(interval).await;
            }
            debug!("Active sensor loop finished");
        });

        tasks.handles.retain(|h| !h.is_finished());
        tasks.handles.push(task);
        tasks.running = Some(running);
        Ok(())
    }

    /// Ask the task to finish
    ///
    /// Best effort: a reading already in flight is still delivered, and the
    /// loop exits at its next check. Use `join` to wait for it.
    pub fn stop(&self) {
        if self.tasks.lock().stop() {
            info!("Stopping active sensor");
        }
    }

    /// Wait for every stopped task of this sensor to exit
    pub async fn join(&self) {
        let handles = std::mem::take(&mut self.tasks.lock().handles);
        for task in handles {
            if let Err(e) = task.await {
                warn!("Active sensor task failed: {}", e);
            }
        }
    }
}

impl<T> Drop for ActiveSensor<T> {
    fn drop(&mut self) {
        self.tasks.get_mut().stop();
    }
}

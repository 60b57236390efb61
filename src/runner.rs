//! Run loop and host-facing command/listener interface.
//!
//! This is the "Run loop" component from the system overview: a worker
//! thread that owns a [`GameBoy`] core and exposes the handful of host
//! commands and listener registrations the host touches. No peripheral
//! holds a back-reference to this module; it only calls `clock()` on the
//! core in a fixed order and polls the core's own state (current frame
//! number, audio buffer occupancy, watchpoint hits) to decide when to
//! fire a listener.
//!
//! The core itself is mutated only from the worker thread once `run()`
//! has been called; host commands issued while the loop is running
//! briefly lock the shared state to enqueue a change (new breakpoint,
//! new pressed-keys snapshot) and return without blocking on emulation.

use std::{
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use dmgboy_common::error::Error;

use crate::{
    gb::GameBoy,
    mmu::{WatchHit, WatchKind},
    pad::PadKey,
};

pub type ListenerId = u64;

type FrameListener = Box<dyn FnMut(&[u8]) + Send>;
type AudioListener = Box<dyn FnMut(&[i16], &[i16]) + Send>;
type NotifyListener = Box<dyn FnMut() + Send>;

/// A small append/remove registry shared by every listener kind below.
/// Registration returns an id; that id is the deregistration handle.
struct Registry<F: ?Sized> {
    next_id: ListenerId,
    entries: Vec<(ListenerId, Box<F>)>,
}

impl<F: ?Sized> Registry<F> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn register(&mut self, callback: Box<F>) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    fn deregister(&mut self, id: ListenerId) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

#[derive(Default)]
struct Listeners {
    frame: Option<Registry<FrameListener>>,
    audio: Option<Registry<AudioListener>>,
    cpu_state: Option<Registry<NotifyListener>>,
    breakpoints: Option<Registry<NotifyListener>>,
    loop_exited: Option<Registry<NotifyListener>>,
}

macro_rules! registry_accessor {
    ($field:ident, $kind:ty) => {
        fn $field(&mut self) -> &mut Registry<$kind> {
            self.$field.get_or_insert_with(Registry::new)
        }
    };
}

impl Listeners {
    registry_accessor!(frame, FrameListener);
    registry_accessor!(audio, AudioListener);
    registry_accessor!(cpu_state, NotifyListener);
    registry_accessor!(breakpoints, NotifyListener);
    registry_accessor!(loop_exited, NotifyListener);

    fn notify_cpu_state(&mut self) {
        if let Some(registry) = self.cpu_state.as_mut() {
            for (_, callback) in registry.entries.iter_mut() {
                callback();
            }
        }
    }

    fn notify_breakpoints(&mut self) {
        if let Some(registry) = self.breakpoints.as_mut() {
            for (_, callback) in registry.entries.iter_mut() {
                callback();
            }
        }
    }

    fn notify_loop_exited(&mut self) {
        if let Some(registry) = self.loop_exited.as_mut() {
            for (_, callback) in registry.entries.iter_mut() {
                callback();
            }
        }
    }
}

/// Everything the worker thread and the host command handlers share.
/// Guarded by a single mutex: every lock is held only for the duration
/// of one instruction or one host command, never across a blocking call.
struct Shared {
    gb: GameBoy,
    breakpoints: HashSet<u16>,
    listeners: Listeners,
    samples_per_block: u16,
    last_frame: u16,
}

impl Shared {
    fn step(&mut self) {
        self.gb.clock();
        self.dispatch_frame();
        self.dispatch_audio();
    }

    fn dispatch_frame(&mut self) {
        let frame = self.gb.ppu_frame();
        if frame == self.last_frame {
            return;
        }
        self.last_frame = frame;
        if self.listeners.frame.is_none() {
            return;
        }
        let buffer = self.gb.frame_buffer().to_vec();
        for (_, callback) in self.listeners.frame().entries.iter_mut() {
            callback(&buffer);
        }
    }

    fn dispatch_audio(&mut self) {
        if self.listeners.audio.is_none() || self.samples_per_block == 0 {
            return;
        }
        let channels = self.gb.apu_i().channels().max(1) as usize;
        let block = self.samples_per_block as usize;
        loop {
            let available = self.gb.apu_i().audio_buffer().len() / channels;
            if available < block {
                break;
            }
            let mut left = Vec::with_capacity(block);
            let mut right = Vec::with_capacity(block);
            for _ in 0..block {
                let buffer = self.gb.apu().audio_buffer_mut();
                let l = buffer.pop_front().unwrap_or(0);
                let r = if channels > 1 {
                    buffer.pop_front().unwrap_or(0)
                } else {
                    l
                };
                left.push(l as i16);
                right.push(r as i16);
            }
            for (_, callback) in self.listeners.audio().entries.iter_mut() {
                callback(&right, &left);
            }
        }
    }

    fn hit_breakpoint(&self) -> bool {
        self.breakpoints.contains(&self.gb.cpu_i().pc())
    }
}

/// Host-facing handle to a running (or paused) emulator core.
///
/// Owns the worker thread lifecycle: `run()` spawns a thread that clocks
/// the core until `stop()` is called, a breakpoint is hit, or the core
/// panics (e.g. on an illegal opcode). The panic is caught, converted to
/// an [`Error`], and handed back through the completion channel the next
/// time the host calls `join()`.
pub struct Runner {
    shared: Arc<Mutex<Shared>>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    completion_rx: Option<Receiver<Result<(), Error>>>,
}

impl Runner {
    pub fn new(gb: GameBoy) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                gb,
                breakpoints: HashSet::new(),
                listeners: Listeners::default(),
                samples_per_block: 0,
                last_frame: 0,
            })),
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            completion_rx: None,
        }
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    // -- host commands -----------------------------------------------

    pub fn reset(&mut self) -> Result<(), Error> {
        if self.is_running() {
            return Err(Error::InvalidState(String::from(
                "cannot reset while the run loop is active",
            )));
        }
        self.shared.lock().unwrap().gb.reset();
        Ok(())
    }

    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.is_running() {
            return Err(Error::InvalidState(String::from(
                "cannot load a ROM while the run loop is active",
            )));
        }
        self.shared.lock().unwrap().gb.load_rom(data, None)?;
        Ok(())
    }

    /// Spawns the worker thread and starts clocking the core. Returns
    /// `InvalidState` if a loop is already running.
    pub fn run(&mut self) -> Result<(), Error> {
        if self.is_running() {
            return Err(Error::InvalidState(String::from(
                "run loop is already active",
            )));
        }

        self.stop_flag.store(false, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let stop_flag = Arc::clone(&self.stop_flag);
        let (tx, rx) = mpsc::channel();
        self.completion_rx = Some(rx);

        let handle = thread::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| loop {
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }
                let mut guard = shared.lock().unwrap();
                guard.step();
                let stop_on_breakpoint = guard.hit_breakpoint();
                drop(guard);
                if stop_on_breakpoint {
                    stop_flag.store(true, Ordering::SeqCst);
                    break;
                }
            }));

            let result = outcome.map_err(|payload| translate_panic(&payload));

            let mut guard = shared.lock().unwrap();
            guard.listeners.notify_loop_exited();
            drop(guard);

            // the host may have stopped listening for completion; a send
            // error here just means nobody will observe the result
            let _ = tx.send(result);
        });

        self.worker = Some(handle);
        Ok(())
    }

    /// Requests that the loop stop; returns once the worker thread has
    /// exited and yields whatever error (if any) terminated it.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.join()
    }

    fn join(&mut self) -> Result<(), Error> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        let _ = handle.join();
        match self.completion_rx.take() {
            Some(rx) => rx.recv().unwrap_or(Ok(())),
            None => Ok(()),
        }
    }

    /// Executes exactly one instruction while paused, notifying CPU-state
    /// listeners. `InvalidState` if the run loop is currently active.
    pub fn step_over(&mut self) -> Result<(), Error> {
        if self.is_running() {
            return Err(Error::InvalidState(String::from(
                "cannot single-step while the run loop is active",
            )));
        }
        let mut guard = self.shared.lock().unwrap();
        guard.step();
        guard.listeners.notify_cpu_state();
        Ok(())
    }

    pub fn add_breakpoint(&mut self, addr: u16) {
        let mut guard = self.shared.lock().unwrap();
        guard.breakpoints.insert(addr);
        guard.listeners.notify_breakpoints();
    }

    pub fn remove_breakpoint(&mut self, addr: u16) {
        let mut guard = self.shared.lock().unwrap();
        guard.breakpoints.remove(&addr);
        guard.listeners.notify_breakpoints();
    }

    pub fn add_watchpoint(&mut self, addr: u16, kind: WatchKind) {
        self.shared.lock().unwrap().gb.mmu().add_watchpoint(addr, kind);
    }

    pub fn remove_watchpoint(&mut self, addr: u16, kind: WatchKind) {
        self.shared
            .lock()
            .unwrap()
            .gb
            .mmu()
            .remove_watchpoint(addr, kind);
    }

    pub fn take_watch_hits(&mut self) -> Vec<WatchHit> {
        self.shared.lock().unwrap().gb.mmu().take_watch_hits()
    }

    /// Atomically replaces the set of currently pressed keys; keys that
    /// drop out of the set are released, keys newly in the set are
    /// pressed (which is where the joypad interrupt edge is detected).
    pub fn update_pressed_keys(&mut self, pressed: &HashSet<PadKey>) {
        const ALL_KEYS: [PadKey; 8] = [
            PadKey::Up,
            PadKey::Down,
            PadKey::Left,
            PadKey::Right,
            PadKey::Start,
            PadKey::Select,
            PadKey::A,
            PadKey::B,
        ];
        let mut guard = self.shared.lock().unwrap();
        for key in ALL_KEYS {
            if pressed.contains(&key) {
                guard.gb.key_press(key);
            } else {
                guard.gb.key_lift(key);
            }
        }
    }

    /// Configures the cadence at which `on_new_audio_block` fires:
    /// `samples_per_block` host-rate samples are buffered per call, at
    /// roughly `blocks_per_second` calls per second given the host's
    /// sample rate (`blocks_per_second * samples_per_block` ≈ sample rate).
    pub fn set_expected_sample_rate(&mut self, blocks_per_second: u16, samples_per_block: u16) {
        let mut guard = self.shared.lock().unwrap();
        guard.samples_per_block = samples_per_block;
        let sample_rate = blocks_per_second.saturating_mul(samples_per_block);
        if sample_rate > 0 {
            guard.gb.apu().set_sampling_rate(sample_rate);
        }
    }

    // -- listener registration -----------------------------------------

    pub fn on_new_frame(&mut self, callback: impl FnMut(&[u8]) + Send + 'static) -> ListenerId {
        self.shared
            .lock()
            .unwrap()
            .listeners
            .frame()
            .register(Box::new(callback))
    }

    pub fn remove_new_frame_listener(&mut self, id: ListenerId) {
        if let Some(registry) = self.shared.lock().unwrap().listeners.frame.as_mut() {
            registry.deregister(id);
        }
    }

    pub fn on_new_audio_block(
        &mut self,
        callback: impl FnMut(&[i16], &[i16]) + Send + 'static,
    ) -> ListenerId {
        self.shared
            .lock()
            .unwrap()
            .listeners
            .audio()
            .register(Box::new(callback))
    }

    pub fn remove_new_audio_block_listener(&mut self, id: ListenerId) {
        if let Some(registry) = self.shared.lock().unwrap().listeners.audio.as_mut() {
            registry.deregister(id);
        }
    }

    pub fn on_cpu_state_changed(&mut self, callback: impl FnMut() + Send + 'static) -> ListenerId {
        self.shared
            .lock()
            .unwrap()
            .listeners
            .cpu_state()
            .register(Box::new(callback))
    }

    pub fn on_breakpoints_changed(
        &mut self,
        callback: impl FnMut() + Send + 'static,
    ) -> ListenerId {
        self.shared
            .lock()
            .unwrap()
            .listeners
            .breakpoints()
            .register(Box::new(callback))
    }

    pub fn on_running_loop_exited(
        &mut self,
        callback: impl FnMut() + Send + 'static,
    ) -> ListenerId {
        self.shared
            .lock()
            .unwrap()
            .listeners
            .loop_exited()
            .register(Box::new(callback))
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

fn translate_panic(payload: &(dyn std::any::Any + Send)) -> Error {
    if let Some(message) = payload.downcast_ref::<&str>() {
        Error::CustomError(message.to_string())
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Error::CustomError(message.clone())
    } else {
        Error::CustomError(String::from("run loop terminated unexpectedly"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmu::WatchKind;
    use std::sync::atomic::AtomicU32;

    fn booted_runner() -> Runner {
        let mut gb = GameBoy::new(None);
        gb.load(true).unwrap();
        gb.load_rom_empty().unwrap();
        Runner::new(gb)
    }

    #[test]
    fn test_step_over_runs_one_instruction_while_paused() {
        let mut runner = booted_runner();
        let pc_before = runner.shared.lock().unwrap().gb.cpu_i().pc();
        runner.step_over().unwrap();
        let pc_after = runner.shared.lock().unwrap().gb.cpu_i().pc();
        assert_ne!(pc_before, pc_after);
    }

    #[test]
    fn test_step_over_rejected_while_running() {
        let mut runner = booted_runner();
        runner.run().unwrap();
        let result = runner.step_over();
        assert!(matches!(result, Err(Error::InvalidState(_))));
        runner.stop().unwrap();
    }

    #[test]
    fn test_breakpoint_stops_the_loop() {
        let mut runner = booted_runner();
        let target = runner.shared.lock().unwrap().gb.cpu_i().pc().wrapping_add(4);
        runner.add_breakpoint(target);
        runner.run().unwrap();
        let _ = runner.join();
        let pc = runner.shared.lock().unwrap().gb.cpu_i().pc();
        assert_eq!(pc, target);
    }

    #[test]
    fn test_watchpoint_round_trip() {
        let mut runner = booted_runner();
        runner.add_watchpoint(0xc000, WatchKind::Write);
        runner.shared.lock().unwrap().gb.mmu().write(0xc000, 0x5);
        let hits = runner.take_watch_hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].addr, 0xc000);
    }

    #[test]
    fn test_new_frame_listener_receives_a_full_buffer() {
        let mut runner = booted_runner();
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);
        runner.on_new_frame(move |buffer| {
            assert_eq!(buffer.len(), crate::ppu::FRAME_BUFFER_SIZE);
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        // force one vblank's worth of frame advance directly, bypassing
        // the background thread so the test stays deterministic
        let mut guard = runner.shared.lock().unwrap();
        guard.gb.next_frame();
        guard.dispatch_frame();
        drop(guard);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

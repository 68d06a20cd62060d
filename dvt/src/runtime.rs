//! Mio-backed driver that pumps PTY and child-process events for whatever
//! [`Driver`] implementation it is handed — in practice,
//! [`TerminalEngine`](crate::terminal::TerminalEngine).
//!
//! [`Runtime`] owns its own request channel and [`mio::Waker`], independent
//! of the driver's own request/event plumbing (see
//! [`channel`](crate::terminal::channel)): a [`RuntimeRequestProxy`] can
//! submit a request and wake the blocking poll from any thread, while the
//! driver's own channel stays useful for callers already running on the
//! runtime thread.

use std::io::ErrorKind;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, Sender, TryRecvError};
use mio::{Events, Interest, Poll, Registry, Token, Waker};

use crate::Result;
use crate::error::Error;
use crate::terminal::TerminalRequest;

const PTY_IO_TOKEN: Token = Token(0);
const PTY_CHILD_TOKEN: Token = Token(1);
const RUNTIME_WAKE_TOKEN: Token = Token(2);
const DEFAULT_EVENT_CAPACITY: usize = 128;
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(150);

/// Interface implemented by terminal engines that [`Runtime`] can drive.
pub trait Driver {
    /// Register the underlying session with a mio registry.
    fn register_session(
        &mut self,
        registry: &Registry,
        interest: Interest,
        io_token: Token,
        child_token: Token,
    ) -> Result<()>;

    /// Update registered interest for the session handles.
    fn reregister_session(
        &mut self,
        registry: &Registry,
        interest: Interest,
        io_token: Token,
        child_token: Token,
    ) -> Result<()>;

    /// Deregister the session handles from the mio registry.
    fn deregister_session(&mut self, registry: &Registry) -> Result<()>;

    /// Drain readable PTY output. Returns whether the surface changed.
    fn on_readable(&mut self) -> Result<bool>;

    /// Flush any buffered output. Returns whether output remains pending.
    fn on_writable(&mut self) -> Result<bool>;

    /// Periodic maintenance independent of readiness (e.g. sync-mode
    /// timeouts).
    fn tick(&mut self) -> Result<()>;

    /// Hand a request submitted through a [`RuntimeRequestProxy`] to the
    /// driver for processing.
    fn queue_request(&mut self, request: TerminalRequest) -> Result<()>;

    /// Whether the driver has buffered output waiting on a write-ready poll.
    fn has_pending_output(&self) -> bool;

    /// Check whether the child process has exited.
    fn check_child_exit(&mut self) -> Result<Option<ExitStatus>>;

    /// Deadline for the next maintenance tick, if the driver has one.
    fn next_deadline(&self) -> Option<Instant> {
        None
    }

    /// Initial interest set for the session registration.
    fn initial_interest(&self) -> Interest {
        Interest::READABLE
    }
}

/// Hooks that run immediately before and after each poll iteration.
pub trait RuntimeHooks<D: Driver + ?Sized> {
    fn before_poll(&mut self, _driver: &mut D) -> Result<()> {
        Ok(())
    }

    fn after_poll(&mut self, _driver: &mut D) -> Result<()> {
        Ok(())
    }
}

impl<D: Driver + ?Sized> RuntimeHooks<D> for () {}

/// Handle used by front-ends to submit [`TerminalRequest`]s to a [`Runtime`]
/// and wake it out of its blocking poll.
pub struct RuntimeRequestProxy {
    sender: Sender<TerminalRequest>,
    waker: Arc<Waker>,
}

impl Clone for RuntimeRequestProxy {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            waker: Arc::clone(&self.waker),
        }
    }
}

impl RuntimeRequestProxy {
    /// Submit a request and wake the runtime loop.
    pub fn send(&self, request: TerminalRequest) -> Result<()> {
        self.sender
            .send(request)
            .map_err(|_| Error::RuntimeChannelClosed)?;
        self.waker.wake().map_err(Error::Wake)?;
        Ok(())
    }
}

/// Mio-backed event loop that drives a [`Driver`] until it exits or a
/// shutdown request arrives.
pub struct Runtime {
    poll: Poll,
    events: Events,
    request_tx: Sender<TerminalRequest>,
    request_rx: Receiver<TerminalRequest>,
    waker: Arc<Waker>,
    poll_timeout: Option<Duration>,
}

impl Runtime {
    /// Construct a new runtime with the default event capacity.
    pub fn new() -> Result<Self> {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Construct a new runtime with a custom event capacity.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let poll = Poll::new().map_err(Error::Poll)?;
        let waker = Arc::new(
            Waker::new(poll.registry(), RUNTIME_WAKE_TOKEN)
                .map_err(Error::Wake)?,
        );
        let (request_tx, request_rx) = flume::unbounded();

        Ok(Self {
            poll,
            events: Events::with_capacity(capacity.max(16)),
            request_tx,
            request_rx,
            waker,
            poll_timeout: Some(DEFAULT_POLL_TIMEOUT),
        })
    }

    /// Override the timeout used when no driver deadline is pending.
    pub fn set_poll_timeout(&mut self, timeout: Option<Duration>) {
        self.poll_timeout = timeout;
    }

    /// Acquire a proxy that can be used to send requests into the runtime
    /// from another thread.
    #[must_use]
    pub fn proxy(&self) -> RuntimeRequestProxy {
        RuntimeRequestProxy {
            sender: self.request_tx.clone(),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Run the event loop, delegating polling hooks to the provided handler.
    pub fn run<D, H>(&mut self, driver: &mut D, mut hooks: H) -> Result<()>
    where
        D: Driver + ?Sized,
        H: RuntimeHooks<D>,
    {
        let mut interest = driver.initial_interest();
        driver.register_session(
            self.poll.registry(),
            interest,
            PTY_IO_TOKEN,
            PTY_CHILD_TOKEN,
        )?;

        let run_result = (|| -> Result<()> {
            loop {
                hooks.before_poll(driver)?;

                if self.drain_requests(driver)? {
                    break;
                }

                self.poll_once(driver.next_deadline())?;

                let mut exit_status: Option<ExitStatus> = None;

                for event in self.events.iter() {
                    match event.token() {
                        PTY_IO_TOKEN => {
                            if event.is_readable() {
                                driver.on_readable()?;
                            }
                            if event.is_writable() {
                                driver.on_writable()?;
                            }
                        },
                        PTY_CHILD_TOKEN => {
                            if let Some(status) = driver.check_child_exit()? {
                                exit_status.get_or_insert(status);
                            }
                        },
                        RUNTIME_WAKE_TOKEN | _ => {},
                    }
                }

                let shutdown_requested = self.drain_requests(driver)?;

                if exit_status.is_none() {
                    exit_status = driver.check_child_exit()?;
                }

                driver.tick()?;

                hooks.after_poll(driver)?;

                if exit_status.is_some() || shutdown_requested {
                    break;
                }

                let mut desired_interest = Interest::READABLE;
                if driver.has_pending_output() {
                    desired_interest |= Interest::WRITABLE;
                }

                if desired_interest != interest {
                    driver.reregister_session(
                        self.poll.registry(),
                        desired_interest,
                        PTY_IO_TOKEN,
                        PTY_CHILD_TOKEN,
                    )?;
                    interest = desired_interest;
                }
            }

            Ok(())
        })();

        let deregister_result =
            driver.deregister_session(self.poll.registry());

        run_result?;
        deregister_result?;

        Ok(())
    }

    fn poll_once(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.events.clear();

        let timeout = match deadline {
            Some(deadline) => {
                let remaining =
                    deadline.saturating_duration_since(Instant::now());
                Some(match self.poll_timeout {
                    Some(configured) => remaining.min(configured),
                    None => remaining,
                })
            },
            None => self.poll_timeout,
        };

        loop {
            match self.poll.poll(&mut self.events, timeout) {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Poll(err)),
            }
        }

        Ok(())
    }

    fn drain_requests<D>(&mut self, driver: &mut D) -> Result<bool>
    where
        D: Driver + ?Sized,
    {
        let mut shutdown_requested = false;

        loop {
            match self.request_rx.try_recv() {
                Ok(request) => {
                    if matches!(request, TerminalRequest::Shutdown) {
                        shutdown_requested = true;
                    }
                    driver.queue_request(request)?;
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        Ok(shutdown_requested)
    }
}

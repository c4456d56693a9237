#[cfg(test)]
mod tests {
    use crate::codec::{LinkFrame, SADP_ETHERTYPE};
    use crate::daemon::*;
    use crate::error::{Result, SadpError};
    use crate::identity::NetworkIdentity;
    use crate::logging::{LogLevel, SadpLogger};
    use crate::packet::{FrameCounter, PacketBuilder};
    use crate::transport::LinkTransport;
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind};
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct MockTransport {
        identity: NetworkIdentity,
        inbound: Mutex<VecDeque<io::Result<Vec<u8>>>>,
        sent: Mutex<Vec<Vec<u8>>>,
        receives: AtomicUsize,
        // Stopped when the queue runs dry so tests never spin forever.
        on_empty: Mutex<Option<StopHandle>>,
    }

    impl MockTransport {
        fn new(inbound: Vec<io::Result<Vec<u8>>>) -> Arc<Self> {
            Arc::new(MockTransport {
                identity: identity(),
                inbound: Mutex::new(inbound.into()),
                sent: Mutex::new(Vec::new()),
                receives: AtomicUsize::new(0),
                on_empty: Mutex::new(None),
            })
        }

        fn stop_when_empty(&self, handle: StopHandle) {
            *self.on_empty.lock().unwrap() = Some(handle);
        }
    }

    impl LinkTransport for MockTransport {
        fn send(&self, data: &[u8]) -> io::Result<usize> {
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(data.len())
        }

        fn receive(&self, buffer: &mut [u8]) -> io::Result<usize> {
            self.receives.fetch_add(1, Ordering::SeqCst);
            match self.inbound.lock().unwrap().pop_front() {
                Some(Ok(frame)) => {
                    buffer[..frame.len()].copy_from_slice(&frame);
                    Ok(frame.len())
                }
                Some(Err(e)) => Err(e),
                None => {
                    if let Some(handle) = self.on_empty.lock().unwrap().as_ref() {
                        handle.stop();
                    }
                    Err(io::Error::new(ErrorKind::TimedOut, "no more frames"))
                }
            }
        }

        fn identity(&self) -> &NetworkIdentity {
            &self.identity
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl RecordingLogger {
        fn count(&self, level: LogLevel) -> usize {
            self.lines.lock().unwrap().iter().filter(|(l, _)| *l == level).count()
        }
    }

    impl SadpLogger for RecordingLogger {
        fn log(&self, level: LogLevel, _component: &str, msg: &str) {
            self.lines.lock().unwrap().push((level, msg.to_string()));
        }
    }

    struct CountingListener {
        calls: AtomicUsize,
        labels: Mutex<Vec<&'static str>>,
    }

    impl CountingListener {
        fn new() -> Arc<Self> {
            Arc::new(CountingListener {
                calls: AtomicUsize::new(0),
                labels: Mutex::new(Vec::new()),
            })
        }
    }

    impl PacketListener for CountingListener {
        fn on_packet_received(&self, event: &PacketEvent<'_>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.labels.lock().unwrap().push(event.query_label());
            Ok(())
        }
    }

    struct StoppingListener {
        handle: StopHandle,
        calls: AtomicUsize,
    }

    impl PacketListener for StoppingListener {
        fn on_packet_received(&self, _event: &PacketEvent<'_>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.handle.stop();
            Ok(())
        }
    }

    struct OrderListener {
        id: usize,
        log: Arc<Mutex<Vec<usize>>>,
    }

    impl PacketListener for OrderListener {
        fn on_packet_received(&self, _event: &PacketEvent<'_>) -> Result<()> {
            self.log.lock().unwrap().push(self.id);
            Ok(())
        }
    }

    struct FailingListener;

    impl PacketListener for FailingListener {
        fn on_packet_received(&self, _event: &PacketEvent<'_>) -> Result<()> {
            Err(SadpError::Listener("rejected".into()))
        }
    }

    struct PanickingListener;

    impl PacketListener for PanickingListener {
        fn on_packet_received(&self, _event: &PacketEvent<'_>) -> Result<()> {
            panic!("listener blew up");
        }
    }

    fn identity() -> NetworkIdentity {
        NetworkIdentity::new(
            3,
            "eth0",
            "00:11:22:33:44:55".parse().unwrap(),
            Ipv4Addr::new(192, 168, 1, 100),
            "fe80::211:22ff:fe33:4455".parse().unwrap(),
        )
    }

    fn sadp_frame() -> Vec<u8> {
        let builder = PacketBuilder::new(Arc::new(FrameCounter::with_start(0x1c80)));
        builder.build_inquiry(Some(&identity())).unwrap().encode()
    }

    fn device_response() -> Vec<u8> {
        let mut bytes = sadp_frame();
        bytes[14 + 1] = 0x01; // Response
        bytes[14 + 10] = 0x04; // InquiryResponse
        bytes
    }

    fn foreign_frame() -> Vec<u8> {
        let mut bytes = sadp_frame();
        bytes[12..14].copy_from_slice(&[0x08, 0x00]); // IPv4
        bytes
    }

    fn daemon_over(transport: Arc<MockTransport>, logger: Arc<RecordingLogger>) -> CaptureDaemon {
        let daemon = CaptureDaemon::new(transport.clone()).with_logger(logger);
        transport.stop_when_empty(daemon.stop_handle());
        daemon
    }

    #[test]
    fn test_state_transitions() {
        let transport = MockTransport::new(vec![]);
        let daemon = daemon_over(transport, Arc::new(RecordingLogger::default()));
        assert_eq!(daemon.state(), DaemonState::Idle);
        assert!(!daemon.stop());

        assert!(daemon.start());
        assert_eq!(daemon.state(), DaemonState::Running);
        assert!(!daemon.start());
        assert_eq!(daemon.state(), DaemonState::Running);

        assert!(daemon.stop());
        assert_eq!(daemon.state(), DaemonState::Stopping);

        // the loop observes the flag at its first check and settles in Idle
        daemon.run();
        assert_eq!(daemon.state(), DaemonState::Idle);
    }

    #[test]
    fn test_run_without_start_returns() {
        let transport = MockTransport::new(vec![Ok(sadp_frame())]);
        let logger = Arc::new(RecordingLogger::default());
        let daemon = daemon_over(transport.clone(), logger.clone());
        daemon.run();
        assert_eq!(transport.receives.load(Ordering::SeqCst), 0);
        assert_eq!(logger.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_listener_stop_ends_after_one_cycle() {
        let transport = MockTransport::new(vec![Ok(sadp_frame()), Ok(sadp_frame())]);
        let daemon = daemon_over(transport.clone(), Arc::new(RecordingLogger::default()));
        let listener = Arc::new(StoppingListener {
            handle: daemon.stop_handle(),
            calls: AtomicUsize::new(0),
        });
        assert!(daemon.add_listener(Some(listener.clone())));

        daemon.start();
        daemon.run();

        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.receives.load(Ordering::SeqCst), 1);
        assert_eq!(daemon.state(), DaemonState::Idle);
    }

    #[test]
    fn test_foreign_ethertype_is_ignored() {
        let transport = MockTransport::new(vec![Ok(foreign_frame())]);
        let daemon = daemon_over(transport.clone(), Arc::new(RecordingLogger::default()));
        let listener = CountingListener::new();
        daemon.add_listener(Some(listener.clone()));

        daemon.start();
        daemon.run();

        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
        assert_eq!(transport.receives.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispatch_labels_requests_and_responses() {
        let transport = MockTransport::new(vec![Ok(sadp_frame()), Ok(device_response())]);
        let daemon = daemon_over(transport, Arc::new(RecordingLogger::default()));
        let listener = CountingListener::new();
        daemon.add_listener(Some(listener.clone()));

        daemon.start();
        daemon.run();

        assert_eq!(*listener.labels.lock().unwrap(), vec!["Inquiry", "Inquiry"]);
    }

    #[test]
    fn test_notification_order_matches_registration() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport::new(vec![Ok(sadp_frame())]);
        let daemon = daemon_over(transport, Arc::new(RecordingLogger::default()));
        for id in [3, 1, 2] {
            daemon.add_listener(Some(Arc::new(OrderListener { id, log: order.clone() })));
        }

        daemon.start();
        daemon.run();

        assert_eq!(*order.lock().unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_errors_do_not_end_the_loop() {
        let mut short = sadp_frame();
        short.truncate(60);
        let transport = MockTransport::new(vec![
            Err(io::Error::new(ErrorKind::Other, "link down")),
            Ok(short),
            Ok(sadp_frame()),
        ]);
        let logger = Arc::new(RecordingLogger::default());
        let daemon = daemon_over(transport, logger.clone());
        daemon.add_listener(Some(Arc::new(FailingListener)));
        daemon.add_listener(Some(Arc::new(PanickingListener)));
        let counting = CountingListener::new();
        daemon.add_listener(Some(counting.clone()));

        daemon.start();
        daemon.run();

        // the listener after the failing ones still sees the good frame
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        // link down, the panicking listener, the final empty-queue receive
        assert_eq!(logger.count(LogLevel::Error), 3);
        // malformed frame + failing listener
        assert_eq!(logger.count(LogLevel::Warn), 2);
    }

    #[test]
    fn test_add_and_remove_listener() {
        let transport = MockTransport::new(vec![]);
        let daemon = daemon_over(transport, Arc::new(RecordingLogger::default()));
        assert!(!daemon.add_listener(None));
        assert_eq!(daemon.listener_count(), 0);

        let a: Arc<dyn PacketListener> = CountingListener::new();
        let b: Arc<dyn PacketListener> = CountingListener::new();
        assert!(daemon.add_listener(Some(a.clone())));
        assert!(daemon.add_listener(Some(b.clone())));
        assert!(daemon.add_listener(Some(a.clone())));
        assert_eq!(daemon.listener_count(), 3);

        assert!(daemon.remove_listener(&a));
        assert_eq!(daemon.listener_count(), 2);
        assert!(daemon.remove_listener(&a));
        assert!(!daemon.remove_listener(&a));
        assert!(daemon.remove_listener(&b));
        assert_eq!(daemon.listener_count(), 0);
    }

    #[test]
    fn test_process_frame_counts_handlers() {
        let transport = MockTransport::new(vec![]);
        let daemon = daemon_over(transport, Arc::new(RecordingLogger::default()));
        daemon.add_listener(Some(CountingListener::new()));
        daemon.add_listener(Some(Arc::new(FailingListener)));

        assert_eq!(daemon.process_frame(&sadp_frame()).unwrap(), 1);
        assert_eq!(daemon.process_frame(&foreign_frame()).unwrap(), 0);
        assert_eq!(daemon.process_frame(&[0u8; 10]).unwrap(), 0);
        assert!(matches!(
            daemon.process_frame(&sadp_frame()[..79]),
            Err(SadpError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_event_exposes_frame_and_transport() {
        struct Inspect;
        impl PacketListener for Inspect {
            fn on_packet_received(&self, event: &PacketEvent<'_>) -> Result<()> {
                assert_eq!(event.header.ethertype, SADP_ETHERTYPE);
                assert_eq!(event.frame.counter, 0x1c80);
                assert_eq!(event.raw.len(), 80);
                assert_eq!(event.transport.identity().name, "eth0");
                Ok(())
            }
        }

        let transport = MockTransport::new(vec![]);
        let daemon = daemon_over(transport, Arc::new(RecordingLogger::default()));
        daemon.add_listener(Some(Arc::new(Inspect)));
        assert_eq!(daemon.process_frame(&sadp_frame()).unwrap(), 1);
    }

    #[test]
    fn test_send_inquiry_uses_session_counter() {
        let transport = MockTransport::new(vec![]);
        let daemon = daemon_over(transport.clone(), Arc::new(RecordingLogger::default()))
            .with_counter(Arc::new(FrameCounter::with_start(0x1c80)));

        assert_eq!(daemon.send_inquiry().unwrap(), 80);
        assert_eq!(daemon.send_inquiry().unwrap(), 80);

        let sent = transport.sent.lock().unwrap();
        let first = LinkFrame::decode(&sent[0], crate::codec::DecodeMode::Strict).unwrap();
        let second = LinkFrame::decode(&sent[1], crate::codec::DecodeMode::Strict).unwrap();
        assert_eq!(first.frame.counter, 0x1c80);
        assert_eq!(second.frame.counter, 0x1c81);
        assert_eq!(first.frame.checksum, 0x7729);
    }

    #[test]
    fn test_buffer_size_floor() {
        let transport = MockTransport::new(vec![]);
        let daemon = CaptureDaemon::new(transport).with_buffer_size(512);
        assert_eq!(daemon.buffer_size, 8192);
    }

    /// Claims more bytes than the buffer holds, then delivers one real frame.
    struct OverReportingTransport {
        identity: NetworkIdentity,
        calls: AtomicUsize,
        stop: Mutex<Option<StopHandle>>,
    }

    impl LinkTransport for OverReportingTransport {
        fn send(&self, data: &[u8]) -> io::Result<usize> {
            Ok(data.len())
        }

        fn receive(&self, buffer: &mut [u8]) -> io::Result<usize> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(buffer.len() + 808),
                1 => {
                    let frame = sadp_frame();
                    buffer[..frame.len()].copy_from_slice(&frame);
                    Ok(frame.len())
                }
                _ => {
                    if let Some(handle) = self.stop.lock().unwrap().as_ref() {
                        handle.stop();
                    }
                    Err(io::Error::new(ErrorKind::TimedOut, "no more frames"))
                }
            }
        }

        fn identity(&self) -> &NetworkIdentity {
            &self.identity
        }
    }

    #[test]
    fn test_oversized_receive_length_is_dropped() {
        let transport = Arc::new(OverReportingTransport {
            identity: identity(),
            calls: AtomicUsize::new(0),
            stop: Mutex::new(None),
        });
        let logger = Arc::new(RecordingLogger::default());
        let daemon = CaptureDaemon::new(transport.clone()).with_logger(logger.clone());
        *transport.stop.lock().unwrap() = Some(daemon.stop_handle());
        let listener = CountingListener::new();
        daemon.add_listener(Some(listener.clone()));

        daemon.start();
        daemon.run();

        // the bogus length is logged and the next frame still dispatches
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(logger.count(LogLevel::Warn), 1);
        assert_eq!(daemon.state(), DaemonState::Idle);
    }

    #[test]
    fn test_finish_keeps_a_rearmed_daemon_running() {
        let transport = MockTransport::new(vec![]);
        let daemon = daemon_over(transport, Arc::new(RecordingLogger::default()));

        daemon.start();
        daemon.stop();
        // restarted before the loop got to clean up
        assert!(daemon.start());
        daemon.finish();
        assert_eq!(daemon.state(), DaemonState::Running);

        daemon.stop();
        daemon.finish();
        assert_eq!(daemon.state(), DaemonState::Idle);
    }
}

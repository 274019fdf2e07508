//! # Backpressure
//!
//! Pushes wait for room, pops wait for messages, and waiting connections
//! are abandoned when their peer leaves or the server stops.

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::thread;
    use std::time::{Duration, Instant};

    use stack_service::{PushReply, ServiceConfig};

    use crate::integration::{client, start, wait_for_waiters, wait_until};

    #[test]
    fn test_blocked_pop_receives_next_push() {
        let server = start(ServiceConfig::for_testing());

        let popper = {
            let client = client(&server);
            thread::spawn(move || client.pop())
        };
        wait_for_waiters(&server, 1);

        assert_eq!(client(&server).push(b"x").unwrap(), PushReply::Accepted);

        let reply = popper.join().unwrap().unwrap();
        assert_eq!(reply.into_message().unwrap().as_bytes(), b"x");
        assert_eq!(server.snapshot().stack_size, 0);
    }

    #[test]
    fn test_full_store_push_blocks_until_pop() {
        let capacity = 3;
        let server = start(ServiceConfig {
            stack_capacity: capacity,
            ..ServiceConfig::for_testing()
        });
        let client = client(&server);
        for i in 0..capacity {
            client.push(&[i as u8]).unwrap();
        }

        let pusher = {
            let client = client.clone();
            thread::spawn(move || client.push(b"late"))
        };
        wait_for_waiters(&server, 1);
        thread::sleep(Duration::from_millis(100));
        assert!(!pusher.is_finished());
        assert_eq!(server.snapshot().stack_size, capacity);

        let top = client.pop().unwrap().into_message().unwrap();
        assert_eq!(top.as_bytes(), &[capacity as u8 - 1]);

        assert_eq!(pusher.join().unwrap().unwrap(), PushReply::Accepted);
        assert_eq!(server.snapshot().stack_size, capacity);
        assert_eq!(
            client.pop().unwrap().into_message().unwrap().as_bytes(),
            b"late"
        );
    }

    #[test]
    fn test_size_never_exceeds_capacity_under_contention() {
        let capacity = 4;
        let server = start(ServiceConfig {
            stack_capacity: capacity,
            ..ServiceConfig::for_testing()
        });

        let pushers: Vec<_> = (0..8u8)
            .map(|i| {
                let client = client(&server);
                thread::spawn(move || client.push(&[i]))
            })
            .collect();

        wait_until("store to fill", || server.snapshot().stack_size == capacity);
        wait_for_waiters(&server, 4);
        assert_eq!(server.snapshot().stack_size, capacity);

        let popper = client(&server);
        for _ in 0..8 {
            assert!(server.snapshot().stack_size <= capacity);
            popper.pop().unwrap().into_message().unwrap();
        }
        for pusher in pushers {
            assert_eq!(pusher.join().unwrap().unwrap(), PushReply::Accepted);
        }
        assert_eq!(server.snapshot().stack_size, 0);
    }

    #[test]
    fn test_abandoned_pop_does_not_consume_later_push() {
        let server = start(ServiceConfig::for_testing());

        let mut stream = client(&server).connect().unwrap();
        stream.write_all(&[0x80]).unwrap();
        wait_for_waiters(&server, 1);
        drop(stream);

        wait_for_waiters(&server, 0);
        wait_until("permit release", || server.snapshot().active_connections == 0);

        client(&server).push(b"kept").unwrap();
        assert_eq!(server.snapshot().stack_size, 1);
    }

    fn idle_after(secs: u64) -> ServiceConfig {
        ServiceConfig {
            idle_timeout_secs: secs,
            ..ServiceConfig::for_testing()
        }
    }

    #[test]
    fn test_silent_peer_mid_payload_is_dropped_after_idle_timeout() {
        let server = start(idle_after(1));

        let mut stream = client(&server).connect().unwrap();
        stream.write_all(&[0x05, b'a', b'b']).unwrap();
        let sent = Instant::now();

        let mut reply = Vec::new();
        let _ = stream.read_to_end(&mut reply);
        assert!(reply.is_empty());
        assert!(sent.elapsed() >= Duration::from_millis(900));

        assert_eq!(server.snapshot().stack_size, 0);
        wait_until("permit release", || server.snapshot().active_connections == 0);
        wait_for_waiters(&server, 0);
    }

    #[test]
    fn test_silent_peer_without_header_is_dropped_after_idle_timeout() {
        let server = start(idle_after(1));

        let mut stream = client(&server).connect().unwrap();
        let mut reply = Vec::new();
        let _ = stream.read_to_end(&mut reply);

        assert!(reply.is_empty());
        assert_eq!(server.snapshot().active_connections, 0);
        assert_eq!(client(&server).push(b"ok").unwrap(), PushReply::Accepted);
    }

    #[test]
    fn test_shutdown_releases_waiting_pop() {
        let server = start(ServiceConfig::for_testing());

        let popper = {
            let client = client(&server);
            thread::spawn(move || client.pop())
        };
        wait_for_waiters(&server, 1);

        let state = std::sync::Arc::clone(server.state());
        server.shutdown().unwrap();

        // Closed without a reply.
        assert!(popper.join().unwrap().is_err());
        wait_until("waiter release", || state.snapshot().waiting == 0);
    }
}

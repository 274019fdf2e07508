//! # Admission Control
//!
//! Connection cap enforcement, busy replies and eviction of stale waiters.

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use stack_service::test_utils::ManualTimeSource;
    use stack_service::{PopReply, PushReply, ServiceConfig};

    use crate::integration::{client, start, start_with_clock, wait_for_waiters, wait_until};

    fn capped(max_connections: usize) -> ServiceConfig {
        ServiceConfig {
            max_connections,
            ..ServiceConfig::for_testing()
        }
    }

    #[test]
    fn test_connection_over_cap_gets_busy() {
        let server = start(capped(2));
        let poppers: Vec<_> = (0..2)
            .map(|_| {
                let client = client(&server);
                thread::spawn(move || client.pop())
            })
            .collect();
        wait_for_waiters(&server, 2);

        assert_eq!(client(&server).push(b"no").unwrap(), PushReply::Busy);
        assert_eq!(client(&server).pop().unwrap(), PopReply::Busy);
        assert_eq!(server.snapshot().stack_size, 0);
        assert_eq!(server.snapshot().active_connections, 2);

        server.shutdown().unwrap();
        for popper in poppers {
            assert!(popper.join().unwrap().is_err());
        }
    }

    #[test]
    fn test_slot_freed_after_connection_finishes() {
        let server = start(capped(1));
        let client = client(&server);

        for _ in 0..5 {
            assert_eq!(client.push(b"v").unwrap(), PushReply::Accepted);
            wait_until("permit release", || server.snapshot().active_connections == 0);
        }
        assert_eq!(server.snapshot().stack_size, 5);
    }

    #[test]
    fn test_stale_waiter_evicted_for_new_connection() {
        let clock = ManualTimeSource::new(1_000);
        let config = capped(1);
        let stale_after = config.stale_after();
        let server = start_with_clock(config, &clock);

        let victim = {
            let client = client(&server);
            thread::spawn(move || client.pop())
        };
        wait_for_waiters(&server, 1);

        clock.advance(stale_after);
        assert_eq!(client(&server).push(b"new").unwrap(), PushReply::Accepted);

        assert_eq!(victim.join().unwrap().unwrap(), PopReply::Busy);
        assert_eq!(server.snapshot().stack_size, 1);
        wait_until("permits release", || server.snapshot().active_connections == 0);
    }

    #[test]
    fn test_fresh_waiter_not_evicted() {
        let clock = ManualTimeSource::new(1_000);
        let config = capped(1);
        let stale_after = config.stale_after();
        let server = start_with_clock(config, &clock);

        let waiter = {
            let client = client(&server);
            thread::spawn(move || client.pop())
        };
        wait_for_waiters(&server, 1);

        clock.advance(stale_after - Duration::from_secs(1));
        assert_eq!(client(&server).push(b"new").unwrap(), PushReply::Busy);
        assert_eq!(server.snapshot().stack_size, 0);

        server.shutdown().unwrap();
        assert!(waiter.join().unwrap().is_err());
    }

    #[test]
    fn test_oldest_waiter_evicted_first() {
        let clock = ManualTimeSource::new(0);
        let config = capped(2);
        let stale_after = config.stale_after();
        let server = start_with_clock(config, &clock);

        let oldest = {
            let client = client(&server);
            thread::spawn(move || client.pop())
        };
        wait_for_waiters(&server, 1);

        clock.advance(Duration::from_secs(60));
        let younger = {
            let client = client(&server);
            thread::spawn(move || client.pop())
        };
        wait_for_waiters(&server, 2);

        clock.advance(stale_after);
        assert_eq!(client(&server).push(b"n").unwrap(), PushReply::Accepted);
        assert_eq!(oldest.join().unwrap().unwrap(), PopReply::Busy);

        // The younger waiter survives and takes the new message.
        let reply = younger.join().unwrap().unwrap();
        assert_eq!(reply.into_message().unwrap().as_bytes(), b"n");
    }
}

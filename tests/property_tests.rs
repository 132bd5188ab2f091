//! Property-based tests for configuration defaults and connection lifecycle
//!
//! These tests verify that:
//! - Optional connection keys always resolve to their defaults
//! - Any sequence of lifecycle and query operations opens and closes the
//!   connection exactly as often as a simple state model predicts

#[cfg(test)]
mod tests {
    use druidql::config::ConnectionConfig;
    use druidql::handler::{DatabaseHandler, DruidHandler};
    use druidql::test_utils::MockDriver;
    use proptest::prelude::*;
    use serde_json::json;

    #[derive(Debug, Clone)]
    enum Op {
        Connect,
        Disconnect,
        Check,
        Query,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Connect),
            Just(Op::Disconnect),
            Just(Op::Check),
            Just(Op::Query),
        ]
    }

    fn arb_host() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9.-]{0,30}".prop_map(|s: String| s)
    }

    proptest! {
        #[test]
        fn prop_optional_keys_default(host in arb_host(), port in any::<u16>()) {
            let data = match json!({"host": host.clone(), "port": port}) {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            };
            let config = ConnectionConfig::from_map(data).unwrap();
            prop_assert_eq!(config.host, host);
            prop_assert_eq!(config.port, port);
            prop_assert_eq!(config.path, "/druid/v2/sql/");
            prop_assert_eq!(config.scheme, "http");
            prop_assert_eq!(config.user, None);
            prop_assert_eq!(config.password, None);
        }

        #[test]
        fn prop_lifecycle_matches_model(ops in prop::collection::vec(arb_op(), 0..40)) {
            let driver = MockDriver::new();
            let mut handler = DruidHandler::with_driver(
                "prop",
                ConnectionConfig::new("localhost", 8888),
                driver.clone(),
            );

            let mut connected = false;
            let mut opens = 0;
            let mut closes = 0;

            for op in ops {
                match op {
                    Op::Connect => {
                        handler.connect().unwrap();
                        if !connected {
                            opens += 1;
                            connected = true;
                        }
                    }
                    Op::Disconnect => {
                        handler.disconnect().unwrap();
                        if connected {
                            closes += 1;
                            connected = false;
                        }
                    }
                    Op::Check => {
                        prop_assert!(handler.check_connection().success);
                        if !connected {
                            opens += 1;
                            closes += 1;
                        }
                    }
                    Op::Query => {
                        prop_assert!(!handler.execute_raw("SELECT 1").is_error());
                        if !connected {
                            opens += 1;
                            closes += 1;
                        }
                    }
                }

                prop_assert_eq!(handler.is_connected(), connected);
                prop_assert_eq!(driver.opens(), opens);
                prop_assert_eq!(driver.closes(), closes);
            }

            drop(handler);
            if connected {
                closes += 1;
            }
            prop_assert_eq!(driver.closes(), closes);
        }
    }
}

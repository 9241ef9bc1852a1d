#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::buffer::SecureBuffer;
    use crate::client::{KmsConnection, KmsConnector};
    use crate::config::{Config, Endpoint};
    use crate::context::{Context, MAX_ENCRYPT_PLAINTEXT_LEN};
    use crate::credentials::Credentials;
    use crate::error::{Error, Result};

    /// Call counters shared between a mock connector and its connections
    #[derive(Default)]
    struct CallCounters {
        connects: AtomicUsize,
        connection_drops: AtomicUsize,
        encrypts: AtomicUsize,
        decrypts: AtomicUsize,
        lists: AtomicUsize,
        get_policies: AtomicUsize,
        attestations: AtomicUsize,
    }

    // Mock connection that "encrypts" by XOR with a fixed master key,
    // so decrypt is the same operation and round trips are exact.
    struct MockConnection {
        master_key: Vec<u8>,
        connected: Arc<AtomicBool>,
        counters: Arc<CallCounters>,
    }

    impl MockConnection {
        fn xor(&self, data: &[u8]) -> Vec<u8> {
            data.iter()
                .enumerate()
                .map(|(i, b)| b ^ self.master_key[i % self.master_key.len()])
                .collect()
        }
    }

    impl Drop for MockConnection {
        fn drop(&mut self) {
            self.counters.connection_drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl KmsConnection for MockConnection {
        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn encrypt(&self, _key_id: &str, plaintext: &[u8]) -> Result<SecureBuffer> {
            self.counters.encrypts.fetch_add(1, Ordering::SeqCst);
            Ok(SecureBuffer::from_vec(self.xor(plaintext)))
        }

        fn decrypt(
            &self,
            _key_id: &str,
            _algorithm: &str,
            ciphertext: &[u8],
        ) -> Result<SecureBuffer> {
            self.counters.decrypts.fetch_add(1, Ordering::SeqCst);
            Ok(SecureBuffer::from_vec(self.xor(ciphertext)))
        }

        fn list_key_policies(
            &self,
            _key_id: &str,
            _limit: u32,
            _marker: Option<&str>,
        ) -> Result<SecureBuffer> {
            self.counters.lists.fetch_add(1, Ordering::SeqCst);
            Ok(SecureBuffer::from_slice(
                br#"{"PolicyNames":["default"],"Truncated":false}"#,
            ))
        }

        fn get_key_policy(&self, _key_id: &str, _policy_name: &str) -> Result<SecureBuffer> {
            self.counters.get_policies.fetch_add(1, Ordering::SeqCst);
            Ok(SecureBuffer::from_slice(br#"{"Version":"2012-10-17"}"#))
        }

        fn attestation_document(&self) -> Result<SecureBuffer> {
            self.counters.attestations.fetch_add(1, Ordering::SeqCst);
            Ok(SecureBuffer::from_slice(b"attestation-document-bytes"))
        }
    }

    // Mock connector with a call counter and a switchable failure mode.
    // A freshly created connection always starts connected.
    struct MockConnector {
        counters: Arc<CallCounters>,
        connected: Arc<AtomicBool>,
        fail_connect: AtomicBool,
    }

    impl MockConnector {
        fn new() -> Self {
            Self {
                counters: Arc::new(CallCounters::default()),
                connected: Arc::new(AtomicBool::new(true)),
                fail_connect: AtomicBool::new(false),
            }
        }

        fn set_fail_connect(&self, fail: bool) {
            self.fail_connect.store(fail, Ordering::SeqCst);
        }

        fn drop_transport(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }

        fn connect_count(&self) -> usize {
            self.counters.connects.load(Ordering::SeqCst)
        }
    }

    impl KmsConnector for MockConnector {
        fn connect(
            &self,
            _credentials: &Credentials,
            _region: &str,
            _endpoint: Endpoint,
        ) -> Result<Box<dyn KmsConnection>> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);

            if self.fail_connect.load(Ordering::SeqCst) {
                return Err(Error::ClientCreateFailed("mock connect refused".into()));
            }

            self.connected.store(true, Ordering::SeqCst);

            Ok(Box::new(MockConnection {
                master_key: vec![0x5a; 16],
                connected: self.connected.clone(),
                counters: self.counters.clone(),
            }))
        }
    }

    fn test_config() -> Config {
        Config::new("us-east-1", 8000).with_default_key_id("k1")
    }

    fn test_credentials() -> Credentials {
        Credentials::new("AKIAEXAMPLE", "secret-key", "session-token")
    }

    fn initialized_context() -> (Context, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new());
        let ctx = Context::new(connector.clone());
        ctx.init(test_config(), test_credentials())
            .expect("init failed");
        (ctx, connector)
    }

    #[test]
    fn test_init_rejects_incomplete_config() {
        let connector = Arc::new(MockConnector::new());
        let ctx = Context::new(connector.clone());

        // Missing default key id
        let result = ctx.init(Config::new("us-east-1", 8000), test_credentials());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        // Empty region
        let result = ctx.init(
            Config::new("", 8000).with_default_key_id("k1"),
            test_credentials(),
        );
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        // Empty credential field
        let result = ctx.init(test_config(), Credentials::new("AKIA", "", "token"));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        // No client construction was attempted
        assert_eq!(connector.connect_count(), 0);
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn test_init_twice_fails() {
        let (ctx, _connector) = initialized_context();

        let result = ctx.init(test_config(), test_credentials());
        assert!(matches!(result, Err(Error::AlreadyInitialized)));
    }

    #[test]
    fn test_init_connect_failure_is_retryable() {
        let connector = Arc::new(MockConnector::new());
        let ctx = Context::new(connector.clone());

        connector.set_fail_connect(true);
        let result = ctx.init(test_config(), test_credentials());
        assert!(matches!(result, Err(Error::ClientCreateFailed(_))));
        assert!(!ctx.is_initialized());

        // Back to empty state; retry succeeds
        connector.set_fail_connect(false);
        ctx.init(test_config(), test_credentials())
            .expect("retry init failed");
        assert!(ctx.is_initialized());
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let (ctx, _connector) = initialized_context();

        let ciphertext = ctx.encrypt("k1", b"hello").expect("encrypt failed");
        assert!(!ciphertext.is_empty());

        let plaintext = ctx
            .decrypt("k1", "SYMMETRIC_DEFAULT", ciphertext.as_slice())
            .expect("decrypt failed");
        assert_eq!(plaintext.as_slice(), b"hello");
        assert_eq!(plaintext.len(), 5);
    }

    #[test]
    fn test_encrypt_accepts_limit_rejects_over_limit() {
        let (ctx, connector) = initialized_context();

        let at_limit = vec![7u8; MAX_ENCRYPT_PLAINTEXT_LEN];
        ctx.encrypt("k1", &at_limit).expect("encrypt at limit failed");

        let over_limit = vec![7u8; MAX_ENCRYPT_PLAINTEXT_LEN + 1];
        let result = ctx.encrypt("k1", &over_limit);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        // The oversize request never reached the remote side
        assert_eq!(connector.counters.encrypts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_encrypt_rejects_empty_plaintext_and_key() {
        let (ctx, connector) = initialized_context();

        let result = ctx.encrypt("k1", b"");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = ctx.encrypt("", b"data");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        assert_eq!(connector.counters.encrypts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decrypt_rejects_empty_inputs() {
        let (ctx, connector) = initialized_context();

        let result = ctx.decrypt("k1", "SYMMETRIC_DEFAULT", b"");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = ctx.decrypt("", "SYMMETRIC_DEFAULT", b"ct");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = ctx.decrypt("k1", "", b"ct");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        assert_eq!(connector.counters.decrypts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_operations_before_init_fail() {
        let connector = Arc::new(MockConnector::new());
        let ctx = Context::new(connector.clone());

        assert!(matches!(ctx.encrypt("k1", b"x"), Err(Error::NotInitialized)));
        assert!(matches!(
            ctx.decrypt("k1", "SYMMETRIC_DEFAULT", b"x"),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            ctx.list_key_policies("k1", 10, None),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            ctx.get_key_policy("k1", "default"),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            ctx.attestation_document(),
            Err(Error::NotInitialized)
        ));
        assert_eq!(connector.connect_count(), 0);
    }

    #[test]
    fn test_list_key_policies_limit_bounds() {
        let (ctx, connector) = initialized_context();

        for bad_limit in [0, 1001] {
            let result = ctx.list_key_policies("k1", bad_limit, None);
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }

        // Out-of-range limits incurred zero remote cost
        assert_eq!(connector.counters.lists.load(Ordering::SeqCst), 0);

        for good_limit in [1, 1000] {
            ctx.list_key_policies("k1", good_limit, None)
                .expect("in-range limit rejected");
        }

        assert_eq!(connector.counters.lists.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_list_key_policies_with_marker() {
        let (ctx, _connector) = initialized_context();

        let response = ctx
            .list_key_policies("k1", 100, Some("next-page"))
            .expect("list failed");
        assert!(!response.is_empty());
    }

    #[test]
    fn test_get_key_policy_validation_and_success() {
        let (ctx, _connector) = initialized_context();

        let result = ctx.get_key_policy("", "default");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = ctx.get_key_policy("k1", "");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let policy = ctx.get_key_policy("k1", "default").expect("get failed");
        assert!(!policy.is_empty());
    }

    #[test]
    fn test_attestation_document() {
        let (ctx, connector) = initialized_context();

        let doc = ctx.attestation_document().expect("attestation failed");
        assert_eq!(doc.as_slice(), b"attestation-document-bytes");
        assert_eq!(connector.counters.attestations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (ctx, _connector) = initialized_context();

        ctx.shutdown().expect("first shutdown failed");
        ctx.shutdown().expect("second shutdown failed");

        // Indistinguishable from a freshly constructed context
        assert!(!ctx.is_initialized());
        assert!(matches!(ctx.encrypt("k1", b"x"), Err(Error::NotInitialized)));

        // Including being initializable again
        ctx.init(test_config(), test_credentials())
            .expect("re-init after shutdown failed");
    }

    #[test]
    fn test_shutdown_releases_connection() {
        let (ctx, connector) = initialized_context();
        assert_eq!(connector.counters.connection_drops.load(Ordering::SeqCst), 0);

        ctx.shutdown().expect("shutdown failed");
        assert_eq!(connector.counters.connection_drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rotation_and_reconnect_release_the_stale_connection() {
        let (ctx, connector) = initialized_context();

        ctx.update_credentials("AKIA2", "secret2", "token2")
            .expect("update failed");
        assert_eq!(connector.counters.connection_drops.load(Ordering::SeqCst), 1);

        connector.drop_transport();
        ctx.encrypt("k1", b"data").expect("encrypt failed");
        assert_eq!(connector.counters.connection_drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shutdown_before_init_is_noop() {
        let connector = Arc::new(MockConnector::new());
        let ctx = Context::new(connector);

        ctx.shutdown().expect("shutdown on fresh context failed");
        ctx.shutdown().expect("second shutdown failed");
    }

    #[test]
    fn test_update_credentials_before_init_fails() {
        let connector = Arc::new(MockConnector::new());
        let ctx = Context::new(connector.clone());

        let result = ctx.update_credentials("AKIA2", "secret2", "token2");
        assert!(matches!(result, Err(Error::NotInitialized)));
        assert_eq!(connector.connect_count(), 0);
    }

    #[test]
    fn test_update_credentials_rejects_empty_field() {
        let (ctx, connector) = initialized_context();
        let connects_before = connector.connect_count();

        let result = ctx.update_credentials("AKIA2", "", "token2");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        // No reconnect was attempted and the context still works
        assert_eq!(connector.connect_count(), connects_before);
        ctx.encrypt("k1", b"still working").expect("encrypt failed");
    }

    #[test]
    fn test_update_credentials_reconnects_immediately() {
        let (ctx, connector) = initialized_context();
        assert_eq!(connector.connect_count(), 1);

        ctx.update_credentials("AKIA2", "secret2", "token2")
            .expect("update failed");
        assert_eq!(connector.connect_count(), 2);

        ctx.encrypt("k1", b"post-rotation").expect("encrypt failed");
        // Healthy connection; no further create cycles
        assert_eq!(connector.connect_count(), 2);
    }

    #[test]
    fn test_update_credentials_reconnect_failure_defers_to_health_check() {
        let (ctx, connector) = initialized_context();

        connector.set_fail_connect(true);
        let result = ctx.update_credentials("AKIA2", "secret2", "token2");
        assert!(matches!(result, Err(Error::ClientCreateFailed(_))));

        // Credentials were installed; the next operation's health check
        // performs the reconnect once the transport is available again.
        connector.set_fail_connect(false);
        ctx.encrypt("k1", b"recovered").expect("encrypt failed");
        assert_eq!(connector.connect_count(), 3);
    }

    #[test]
    fn test_connected_transport_skips_create_cycle() {
        let (ctx, connector) = initialized_context();
        assert_eq!(connector.connect_count(), 1);

        ctx.encrypt("k1", b"one").expect("encrypt failed");
        ctx.encrypt("k1", b"two").expect("encrypt failed");
        ctx.list_key_policies("k1", 10, None).expect("list failed");

        // Transport stayed up the whole time; no destroy/create cycle ran
        assert_eq!(connector.connect_count(), 1);
    }

    #[test]
    fn test_dropped_transport_triggers_reconnect() {
        let (ctx, connector) = initialized_context();
        assert_eq!(connector.connect_count(), 1);

        connector.drop_transport();

        let ciphertext = ctx.encrypt("k1", b"after drop").expect("encrypt failed");
        assert_eq!(connector.connect_count(), 2);

        // The reconnected client serves subsequent calls without cycling
        let plaintext = ctx
            .decrypt("k1", "SYMMETRIC_DEFAULT", ciphertext.as_slice())
            .expect("decrypt failed");
        assert_eq!(plaintext.as_slice(), b"after drop");
        assert_eq!(connector.connect_count(), 2);
    }
}

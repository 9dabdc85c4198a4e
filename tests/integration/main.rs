//! Integration tests for bundlecache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use bundlecache::http::Response;
    use bundlecache::store::{CacheStorage, DiskStorage};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Nothing listens on the discard port, so every request is refused
    const OFFLINE_ORIGIN: &str = "http://127.0.0.1:9";

    fn bundlecache() -> Command {
        let mut cmd = cargo_bin_cmd!("bundlecache");
        cmd.env_remove("BUNDLECACHE_CONFIG").env("CI", "1");
        cmd
    }

    /// Config with stores under the temp dir and the journal off
    fn write_config(dir: &TempDir, origin: Option<&str>) -> std::path::PathBuf {
        let stores = dir.path().join("stores");
        let bundle = dir.path().join("bundle.json");
        let mut toml = format!(
            "[general]\njournal = false\n\n[stores]\nroot = {:?}\n",
            stores.display().to_string()
        );
        if let Some(origin) = origin {
            toml.push_str(&format!(
                "\n[app]\norigin = \"{}\"\nbundle = {:?}\n",
                origin,
                bundle.display().to_string()
            ));
        }
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml).unwrap();
        std::fs::write(
            &bundle,
            r#"{
                "version": "1.0.0",
                "resources": {"/": "h0", "index.html": "h0", "main.js": "h1", "logo.png": "h2"},
                "shell": ["/", "main.js"]
            }"#,
        )
        .unwrap();
        path
    }

    async fn seed(root: &Path, entries: &[(&str, &str)]) {
        let storage = DiskStorage::new(root);
        let content = storage.open("app-cache").await.unwrap();
        for (url, body) in entries {
            content.put(url, &Response::ok(*body)).await.unwrap();
        }
    }

    #[test]
    fn help_displays() {
        bundlecache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache manager"));
    }

    #[test]
    fn version_displays() {
        bundlecache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("bundlecache"));
    }

    #[test]
    fn config_path() {
        bundlecache()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, None);
        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("app-temp-cache"));
    }

    #[test]
    fn install_without_origin_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, None);
        bundlecache()
            .arg("--config")
            .arg(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No application origin configured"))
            .stderr(predicate::str::contains("--origin"));
    }

    #[test]
    fn install_with_unreadable_bundle_fails() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, None);
        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["--origin", OFFLINE_ORIGIN, "--bundle"])
            .arg(dir.path().join("missing.json"))
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("bundle descriptor"));
    }

    #[test]
    fn install_offline_fails() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some(OFFLINE_ORIGIN));
        bundlecache()
            .arg("--config")
            .arg(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Prefetch"));
    }

    #[test]
    fn message_rejects_unknown() {
        bundlecache().args(["message", "reload"]).assert().failure();
    }

    #[test]
    fn status_on_empty_root() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, None);
        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"record\": null"))
            .stdout(predicate::str::contains("app-manifest"));
    }

    #[tokio::test]
    async fn status_reports_missing_resources() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some(OFFLINE_ORIGIN));
        seed(
            &dir.path().join("stores"),
            &[("http://127.0.0.1:9/main.js", "js")],
        )
        .await;

        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("store.content=app-cache entries=1"))
            .stdout(predicate::str::contains("resources=4"))
            .stdout(predicate::str::contains("missing=3"));
    }

    #[tokio::test]
    async fn fetch_serves_cached_resource_offline() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some(OFFLINE_ORIGIN));
        seed(
            &dir.path().join("stores"),
            &[("http://127.0.0.1:9/main.js", "console.log(1)")],
        )
        .await;

        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["fetch", "/main.js"])
            .assert()
            .success()
            .stdout(predicate::str::contains("console.log(1)"));
    }

    #[tokio::test]
    async fn fetch_root_falls_back_to_cache_offline() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some(OFFLINE_ORIGIN));
        seed(
            &dir.path().join("stores"),
            &[("http://127.0.0.1:9/", "<html>cached</html>")],
        )
        .await;

        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["fetch", "/"])
            .assert()
            .success()
            .stdout(predicate::str::contains("<html>cached</html>"));
    }

    #[test]
    fn fetch_uncached_offline_fails() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, Some(OFFLINE_ORIGIN));
        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["fetch", "logo.png"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network request"));
    }

    #[tokio::test]
    async fn purge_deletes_stores() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, None);
        let root = dir.path().join("stores");
        seed(&root, &[("http://127.0.0.1:9/main.js", "js")]).await;

        bundlecache()
            .arg("--config")
            .arg(&config)
            .args(["purge", "--yes"])
            .assert()
            .success();

        let storage = DiskStorage::new(&root);
        assert!(!storage.has("app-cache").await.unwrap());
    }
}

mod lifecycle_tests {
    use async_trait::async_trait;
    use bundlecache::error::{BundleError, BundleResult};
    use bundlecache::fetch::Fetcher;
    use bundlecache::http::{Request, Response};
    use bundlecache::manifest::Bundle;
    use bundlecache::store::{CacheStorage, DiskStorage};
    use bundlecache::worker::{ActivationOutcome, Interception, Worker, WorkerConfig, WorkerState};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const ORIGIN: &str = "https://app.test";

    /// Serves `<path>@<fingerprint>` for every path of the current bundle
    struct VersionedOrigin {
        files: Mutex<HashMap<String, String>>,
        online: Mutex<bool>,
    }

    impl VersionedOrigin {
        fn new() -> Self {
            Self {
                files: Mutex::new(HashMap::new()),
                online: Mutex::new(true),
            }
        }

        fn deploy(&self, bundle: &Bundle) {
            let mut files = self.files.lock().unwrap();
            files.clear();
            for (key, fingerprint) in bundle.resources.iter() {
                files.insert(
                    bundlecache::keys::resolve(ORIGIN, key),
                    format!("{}@{}", key, fingerprint),
                );
            }
        }

        fn go_offline(&self) {
            *self.online.lock().unwrap() = false;
        }
    }

    #[async_trait]
    impl Fetcher for VersionedOrigin {
        async fn fetch(&self, request: &Request) -> BundleResult<Response> {
            if !*self.online.lock().unwrap() {
                return Err(BundleError::network(&request.url, "offline"));
            }
            Ok(match self.files.lock().unwrap().get(&request.url) {
                Some(body) => Response::ok(body.clone()),
                None => Response::new(404, "not found"),
            })
        }
    }

    fn bundle(version: &str, resources: &str) -> Bundle {
        Bundle::parse(&format!(
            r#"{{"version": "{}", "resources": {}, "shell": ["/", "main.js"]}}"#,
            version, resources
        ))
        .unwrap()
    }

    fn body(interception: Interception) -> String {
        match interception {
            Interception::Respond(response) => String::from_utf8(response.body).unwrap(),
            Interception::Passthrough => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn upgrade_survives_restart_on_disk() {
        let dir = TempDir::new().unwrap();
        let storage: Arc<dyn CacheStorage> = Arc::new(DiskStorage::new(dir.path()));
        let origin = Arc::new(VersionedOrigin::new());

        let v1 = bundle("1", r#"{"/": "a", "main.js": "b", "logo.png": "c"}"#);
        origin.deploy(&v1);
        let config = Arc::new(WorkerConfig::new(ORIGIN, v1).unwrap());
        let mut worker = Worker::new(config, storage.clone(), origin.clone());
        worker.install().await.unwrap();
        assert!(matches!(
            worker.activate().await.unwrap(),
            ActivationOutcome::ColdStart { copied: 2 }
        ));
        // cache logo.png on first use
        body(
            worker
                .handle_fetch(&Request::get("https://app.test/logo.png"))
                .await
                .unwrap(),
        );

        // a new process serves v2, where only main.js changed
        let v2 = bundle("2", r#"{"/": "a", "main.js": "B", "logo.png": "c"}"#);
        origin.deploy(&v2);
        let storage: Arc<dyn CacheStorage> = Arc::new(DiskStorage::new(dir.path()));
        let config = Arc::new(WorkerConfig::new(ORIGIN, v2).unwrap());
        let mut worker = Worker::new(config, storage, origin.clone());
        worker.install().await.unwrap();
        let outcome = worker.activate().await.unwrap();
        assert_eq!(
            outcome,
            ActivationOutcome::WarmUpgrade {
                retained: 2,
                evicted: 1,
                copied: 2
            }
        );
        assert_eq!(worker.state(), WorkerState::Activated);

        origin.go_offline();
        let main = worker
            .handle_fetch(&Request::get("https://app.test/main.js"))
            .await
            .unwrap();
        assert_eq!(body(main), "main.js@B");
        let logo = worker
            .handle_fetch(&Request::get("https://app.test/logo.png?v=2"))
            .await;
        assert!(logo.is_err(), "query URLs are stored under their own key");
        let logo = worker
            .handle_fetch(&Request::get("https://app.test/logo.png"))
            .await
            .unwrap();
        assert_eq!(body(logo), "logo.png@c");
    }
}

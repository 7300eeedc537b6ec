//! Do some preparations for integration tests

use smol::process::Command;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Once, RwLock};
use std::time::Duration;

use mpvwalld::backends::{Backend, LibMpv};
use mpvwalld::{ContentDescriptor, Desktop, SupervisorConfig};

pub static CAPTURED: LazyLock<Arc<RwLock<String>>> =
    LazyLock::new(|| Arc::new(RwLock::new(String::new())));
static INIT: Once = Once::new();

const TIMEOUT: Duration = Duration::from_secs(10);

struct Capturer {
    content: Arc<RwLock<String>>,
}
impl std::io::Write for Capturer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut locked = self.content.write().unwrap();
        locked.push_str(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn setup() {
    INIT.call_once(|| {
        let cap = Capturer {
            content: CAPTURED.clone(),
        };
        env_logger::builder()
            .is_test(true)
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .filter_level(log::LevelFilter::Trace)
            .target(env_logger::Target::Pipe(Box::new(cap)))
            .init();
    });
}

pub fn captured() -> String {
    CAPTURED.read().expect("Cannot read captured log").to_string()
}

/// Waits until the captured log contains `needle`.
pub fn wait_for_log(needle: &str) -> bool {
    wait_until(|| captured().contains(needle))
}

pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    smol::block_on(async {
        let deadline = std::time::Instant::now() + TIMEOUT;
        while std::time::Instant::now() < deadline {
            if cond() {
                return true;
            }
            smol::Timer::after(Duration::from_millis(20)).await;
        }
        cond()
    })
}

/// Runs a future, panicking if it takes too long.
pub fn within<T>(future: impl Future<Output = T>) -> T {
    smol::block_on(smol::future::race(async { Some(future.await) }, async {
        smol::Timer::after(TIMEOUT).await;
        None
    }))
    .expect("timed out")
}

/// Pretends to be the player: runs `sh -c <script>` with the real player arguments.
pub struct Script(pub &'static str);

impl Backend for Script {
    fn get_name(&self) -> String {
        "script".to_string()
    }

    fn get_sys_command(&self, config: &SupervisorConfig, content: &ContentDescriptor) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(self.0)
            .arg("player")
            .args(LibMpv::arguments(config, content));
        if let Some(value) = &config.working_dir {
            cmd.current_dir(value);
        }
        cmd
    }
}

/// Counts desktop refreshes.
#[derive(Default)]
pub struct Recorder {
    refreshes: AtomicUsize,
}

impl Recorder {
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl Desktop for Recorder {
    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn config() -> SupervisorConfig {
    SupervisorConfig::new("libmpvplayer", "/tmp/mpvwalld-test")
}

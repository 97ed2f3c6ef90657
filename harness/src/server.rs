/// Arguments shared by every spawned peer.
pub struct Common<'a> {
    /// Coordinator address
    pub notify: &'a str,

    /// Per-hop delay (in milliseconds)
    pub hop_delay: u64,

    /// Critical-section duration (in milliseconds)
    pub section: u64,

    pub verbose: u8,
}

impl<'a> Common<'a> {
    fn args(&self, id: usize, address: &str, coordinator: bool) -> Vec<String> {
        let mut args = Vec::new();
        if self.verbose > 0 {
            args.push("-".to_string() + &"v".repeat(self.verbose as usize));
        }
        if coordinator {
            args.push("-c".to_string());
        }
        for (flag, value) in vec![
            ("-i", id.to_string()),
            ("-a", address.to_string()),
            ("-n", self.notify.to_string()),
            ("--hop-delay", self.hop_delay.to_string()),
            ("--section", self.section.to_string()),
        ] {
            args.push(flag.to_string());
            args.push(value);
        }
        args
    }
}

/// A spawned peer process, killed when dropped.
pub struct Server(std::process::Child);

impl Server {
    pub fn new(
        path: &std::path::Path,
        id: usize,
        address: &str,
        coordinator: bool,
        common: &Common,
    ) -> std::io::Result<Self> {
        std::process::Command::new(path)
            .args(common.args(id, address, coordinator))
            .spawn()
            .map(Server)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.0.kill().ok();
    }
}

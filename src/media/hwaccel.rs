//! VA-API availability detection.
//!
//! A render node under the DRM device directory is taken as the signal that
//! hardware decoding is usable. Nothing is cached: every call lists the
//! directory again.

use tracing::debug;

use super::commands::{CommandRunner, MediaCommand};
use crate::config::HwAccelConfig;

/// Build the `ls -l <device_dir>` listing command
pub fn device_listing(config: &HwAccelConfig) -> MediaCommand {
    MediaCommand::new(&config.list_binary_path, "Device listing")
        .arg("-l")
        .arg(&config.device_dir)
}

/// Whether the listing text mentions a render node
pub fn listing_has_render_node(listing: &str, pattern: &str) -> bool {
    listing.contains(pattern)
}

/// Detect VA-API support by listing the device directory.
///
/// Stdout and stderr are scanned together. A listing command that cannot be
/// spawned counts as "no acceleration".
pub fn detect_hardware_acceleration(runner: &dyn CommandRunner, config: &HwAccelConfig) -> bool {
    let command = device_listing(config);

    match runner.run(&command) {
        Ok(outcome) => {
            let listing = outcome.stdout_lossy() + &outcome.stderr_lossy();
            listing_has_render_node(&listing, &config.render_node_pattern)
        }
        Err(e) => {
            debug!("Device listing failed, assuming no hardware acceleration: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::commands::{CommandOutcome, MockCommandRunner};
    use std::io;

    const DRI_LISTING: &str = "total 0\n\
        drwxr-xr-x  2 root root         80 Oct  1 09:00 by-path\n\
        crw-rw----+ 1 root video  226,   0 Oct  1 09:00 card0\n\
        crw-rw----+ 1 root render 226, 128 Oct  1 09:00 renderD128\n";

    #[test]
    fn test_device_listing_command() {
        let cmd = device_listing(&HwAccelConfig::default());
        assert_eq!(cmd.binary_path, "ls");
        assert_eq!(cmd.args, vec!["-l", "/dev/dri"]);
    }

    #[test]
    fn test_detects_render_node() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd| cmd.binary_path == "ls" && cmd.has_arg("/dev/dri"))
            .times(1)
            .returning(|_| Ok(CommandOutcome::new(0, DRI_LISTING, "")));

        assert!(detect_hardware_acceleration(&runner, &HwAccelConfig::default()));
    }

    #[test]
    fn test_no_render_node() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Ok(CommandOutcome::new(
                2,
                "",
                "ls: cannot access '/dev/dri': No such file or directory\n",
            ))
        });

        assert!(!detect_hardware_acceleration(&runner, &HwAccelConfig::default()));
    }

    #[test]
    fn test_pattern_in_stderr_counts() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandOutcome::new(1, "", "renderD129: permission denied")));

        assert!(detect_hardware_acceleration(&runner, &HwAccelConfig::default()));
    }

    #[test]
    fn test_listing_error_means_unavailable() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "ls not found")));

        assert!(!detect_hardware_acceleration(&runner, &HwAccelConfig::default()));
    }

    #[test]
    fn test_listing_has_render_node() {
        assert!(listing_has_render_node(DRI_LISTING, "renderD"));
        assert!(!listing_has_render_node("card0\n", "renderD"));
    }
}

use regex::Regex;
use std::collections::HashMap;

/// Parser for pip's install output, associating each collected package
/// with the file actually downloaded for it.
///
/// The output is a linear log driven by a two-state machine: a
/// "Collecting" line names the next package and arms the parser, and the
/// indented "Downloading" line that follows records the file and disarms
/// it. A second "Collecting" line while still armed is not an error; it
/// means the previous package was served from pip's local cache rather
/// than downloaded, and the package is recorded with an empty file name;
/// the same applies to a package still pending when the log ends.
/// "Requirement already satisfied" lines likewise record an empty file
/// name.
///
/// Verbose runs (`-v`/`--verbose`) produce a different download line that
/// carries both the file and the package name, so no state is needed.
pub struct InstallLogParser {
    verbose: bool,
    collecting: Regex,
    downloading: Regex,
    already_satisfied: Regex,
    verbose_downloading: Regex,
}

/// Whether the install arguments put pip in verbose mode.
pub fn is_verbose(args: &[String]) -> bool {
    args.iter().any(|arg| arg == "-v" || arg == "--verbose")
}

impl InstallLogParser {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            collecting: Regex::new(r"^Collecting\s(\w[\w.-]+)").expect("collecting pattern is valid"),
            downloading: Regex::new(r"^\s\sDownloading\s[^\s]*/packages/[^\s]*/([^\s]*)")
                .expect("downloading pattern is valid"),
            already_satisfied: Regex::new(r"^Requirement\salready\ssatisfied:\s(\w[\w.-]+)")
                .expect("already-satisfied pattern is valid"),
            verbose_downloading: Regex::new(
                r"^\s\sDownloading\sfrom\sURL\s.*/packages/.*/(.*)#sha256=[A-Fa-f0-9]{64}\s\(from\s.*/(\w[\w.-]+)/\)$",
            )
            .expect("verbose downloading pattern is valid"),
        }
    }

    /// Returns the lowercase package name to downloaded file name map.
    /// An empty file name means the package was collected but nothing was
    /// downloaded for it in this run.
    pub fn parse(&self, output: &str) -> HashMap<String, String> {
        if self.verbose {
            self.parse_verbose(output)
        } else {
            self.parse_with_state_machine(output)
        }
    }

    fn parse_verbose(&self, output: &str) -> HashMap<String, String> {
        let mut downloads = HashMap::new();
        for line in output.lines() {
            if let Some(captures) = self.verbose_downloading.captures(line) {
                let file = captures[1].to_string();
                let name = captures[2].to_lowercase();
                log::debug!("Found dependency: {} installed with: {}", name, file);
                downloads.insert(name, file);
            }
        }
        downloads
    }

    fn parse_with_state_machine(&self, output: &str) -> HashMap<String, String> {
        let mut downloads = HashMap::new();
        let mut awaiting_file: Option<String> = None;

        for line in output.lines() {
            if let Some(captures) = self.collecting.captures(line) {
                if let Some(previous) = awaiting_file.take() {
                    // The previous package's file never appeared; pip
                    // served it from its cache directory. Re-running with
                    // --no-cache-dir makes the download visible.
                    log::debug!(
                        "Could not resolve download path for package: {}, continuing...",
                        previous
                    );
                    downloads.insert(previous.to_lowercase(), String::new());
                }
                awaiting_file = Some(captures[1].to_string());
            } else if let Some(captures) = self.downloading.captures(line) {
                match awaiting_file.take() {
                    Some(package) => {
                        let file = captures[1].to_string();
                        log::debug!("Found package: {} installed with: {}", package, file);
                        downloads.insert(package.to_lowercase(), file);
                    }
                    None => {
                        log::debug!(
                            "Could not resolve package name for download path: {}, continuing...",
                            &captures[1]
                        );
                    }
                }
            } else if let Some(captures) = self.already_satisfied.captures(line) {
                log::debug!("Found package: {} already installed", &captures[1]);
                downloads.insert(captures[1].to_lowercase(), String::new());
            }
        }
        // A package still awaiting its download line when the log ends
        // was served from pip's cache, same as a back-to-back "Collecting".
        if let Some(pending) = awaiting_file {
            log::debug!(
                "Could not resolve download path for package: {}, continuing...",
                pending
            );
            downloads.insert(pending.to_lowercase(), String::new());
        }
        downloads
    }
}

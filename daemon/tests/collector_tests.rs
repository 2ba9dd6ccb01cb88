use std::time::Duration;
use sysdash_daemon::collector::{default_collector, top_processes, ProcessCollector, SysinfoProcessCollector};

#[cfg(target_os = "linux")]
mod linux {
    use std::io::Write;
    use sysdash_daemon::collector::{LinuxProcessCollector, ProcessCollector};
    use tempfile::NamedTempFile;

    #[test]
    fn test_list_processes_returns_current_process() {
        let collector = LinuxProcessCollector::new();
        let processes = collector.list_processes();
        let current_pid = std::process::id();
        assert!(processes.iter().any(|p| p.pid == current_pid), "Current process should be in the list");
    }

    #[test]
    fn test_current_process_has_owner_and_memory() {
        let collector = LinuxProcessCollector::new();
        let current_pid = std::process::id();
        let processes = collector.list_processes();
        let p = processes
            .iter()
            .find(|p| p.pid == current_pid)
            .expect("Should find current process");
        assert!(!p.name.is_empty());
        assert!(!p.username.is_empty());
        assert!(p.memory_percent > 0.0);
    }

    #[test]
    fn test_load_users_parses_passwd() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "root:x:0:0:root:/root:/bin/bash").unwrap();
        writeln!(file, "alice:x:1000:1000:Alice:/home/alice:/bin/zsh").unwrap();
        writeln!(file, "broken-line").unwrap();
        let users = LinuxProcessCollector::load_users(file.path());
        assert_eq!(users.len(), 2);
        assert_eq!(users[&0], "root");
        assert_eq!(users[&1000], "alice");
    }
}

#[test]
fn test_sysinfo_collector_finds_current_process() {
    let collector = SysinfoProcessCollector::new();
    let current_pid = std::process::id();
    assert!(collector.list_processes().iter().any(|p| p.pid == current_pid));
}

#[test]
fn test_top_processes_is_bounded_and_sorted() {
    let collector = default_collector();
    let top = top_processes(collector.as_ref(), 3, Duration::from_millis(50));
    assert!(top.len() <= 3);
    assert!(top.windows(2).all(|w| w[0].cpu_percent >= w[1].cpu_percent));
}

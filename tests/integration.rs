//! Integration tests for `multi-lookup`.
//!
//! Every test injects a deterministic resolver; the live-DNS test is
//! `#[ignore]`d:
//!
//! ```bash
//! cargo test -- --ignored
//! ```

use multi_lookup::{
    AddressResult, LookupConfig, LookupError, Pipeline, ResolutionMode, SystemResolver,
};
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Resolves `*.invalid` to nothing, `localhost` to v4 + v6 loopback, and
/// everything else to a single documentation address.
fn fake_dns(host: &str, mode: ResolutionMode) -> AddressResult {
    if host.ends_with(".invalid") || host.contains('!') {
        return AddressResult::failure();
    }
    let v4 = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
    match (host, mode) {
        ("localhost", ResolutionMode::All) => AddressResult::from_addrs(vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ]),
        ("localhost", ResolutionMode::Single) => {
            AddressResult::from_addrs(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
        }
        _ => AddressResult::from_addrs(vec![v4]),
    }
}

fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn lines(out: Vec<u8>) -> Vec<String> {
    let mut lines: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect();
    lines.sort();
    lines
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn single_file_all_addresses_one_consumer() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.txt", "example.com\nlocalhost\n");
    let config = LookupConfig::default()
        .with_resolver_bounds(1, 1)
        .with_mode(ResolutionMode::All);

    let mut out = Vec::new();
    let summary = Pipeline::new(config, fake_dns)
        .run(&[input], &mut out)
        .unwrap();

    assert_eq!(summary.resolver_threads, 1);
    assert_eq!(summary.records_written, 2);
    // A single consumer preserves file order.
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "example.com,192.0.2.1\nlocalhost,127.0.0.1,::1\n"
    );
}

#[test]
fn two_files_tiny_queue_no_deadlock() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_input(dir.path(), "a.txt", "a1 a2 a3 a4 a5\n");
    let b = write_input(dir.path(), "b.txt", "b1\nb2\nb3\nb4\nb5\n");
    let config = LookupConfig::default()
        .with_queue_capacity(2)
        .with_resolver_threads(2);

    let mut out = Vec::new();
    let summary = Pipeline::new(config, fake_dns)
        .run(&[a, b], &mut out)
        .unwrap();

    assert_eq!(summary.hostnames_read, 10);
    assert_eq!(summary.records_written, 10);
    let lines = lines(out);
    assert_eq!(lines.len(), 10);
    assert!(lines.iter().all(|l| l.ends_with(",192.0.2.1")));
}

#[test]
fn unresolvable_hostname_gets_empty_field() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.txt", "not!a!host\ngood.example\n");

    for (mode, expected) in [
        (ResolutionMode::Single, "not!a!host,"),
        (ResolutionMode::All, "not!a!host,"),
    ] {
        let mut out = Vec::new();
        let summary = Pipeline::new(LookupConfig::default().with_mode(mode), fake_dns)
            .run(&[&input], &mut out)
            .unwrap();

        assert_eq!(summary.failed_lookups, 1);
        assert_eq!(summary.records_written, 2);
        assert!(lines(out).contains(&expected.to_owned()));
    }
}

#[test]
fn no_inputs_is_a_usage_error() {
    let none: [&Path; 0] = [];
    let err = Pipeline::new(LookupConfig::default(), fake_dns)
        .run(&none, Vec::new())
        .unwrap_err();
    assert!(matches!(err, LookupError::NoInputs));
    assert!(err.is_usage_error());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn every_token_yields_exactly_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<_> = (0..6)
        .map(|f| {
            let body: String = (0..200).map(|i| format!("h{f}-{i}.example\n")).collect();
            write_input(dir.path(), &format!("in{f}.txt"), &body)
        })
        .collect();

    for capacity in [1, 3, 10] {
        let config = LookupConfig::default()
            .with_queue_capacity(capacity)
            .with_resolver_threads(4);
        let mut out = Vec::new();
        let summary = Pipeline::new(config, fake_dns)
            .run(&inputs, &mut out)
            .unwrap();

        let lines = lines(out);
        let mut expected: Vec<String> = (0..6)
            .flat_map(|f| (0..200).map(move |i| format!("h{f}-{i}.example,192.0.2.1")))
            .collect();
        expected.sort();
        assert_eq!(summary.hostnames_read, 1200);
        assert_eq!(lines, expected);
    }
}

#[test]
fn per_source_order_is_preserved_through_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    let body = |prefix: &str| (0..100).map(|i| format!("{prefix}{i} ")).collect::<String>();
    let a = write_input(dir.path(), "a.txt", &body("a"));
    let b = write_input(dir.path(), "b.txt", &body("b"));

    // One resolver thread: pop order == resolve order.
    let seen = Mutex::new(Vec::new());
    let recording = |host: &str, mode: ResolutionMode| {
        seen.lock().push(host.to_owned());
        fake_dns(host, mode)
    };
    let config = LookupConfig::default()
        .with_queue_capacity(2)
        .with_resolver_bounds(1, 1);
    Pipeline::new(config, recording)
        .run(&[a, b], Vec::new())
        .unwrap();

    let seen = seen.into_inner();
    for prefix in ["a", "b"] {
        let order: Vec<usize> = seen
            .iter()
            .filter_map(|h| h.strip_prefix(prefix)?.parse().ok())
            .collect();
        assert_eq!(order, (0..100).collect::<Vec<_>>());
    }
}

#[test]
fn unreadable_source_does_not_affect_others() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_input(dir.path(), "good.txt", "one.example two.example\n");
    let missing = dir.path().join("missing.txt");

    let mut out = Vec::new();
    let summary = Pipeline::new(LookupConfig::default(), fake_dns)
        .run(&[missing.clone(), good], &mut out)
        .unwrap();

    assert_eq!(summary.failed_sources, vec![missing]);
    assert_eq!(lines(out).len(), 2);
}

#[test]
fn empty_inputs_terminate_with_idle_consumers() {
    let dir = tempfile::tempdir().unwrap();
    let empty = write_input(dir.path(), "empty.txt", "");

    // Consumers are asleep on an empty queue when the producers finish; the
    // close broadcast must wake all of them.
    for _ in 0..20 {
        let config = LookupConfig::default().with_resolver_threads(8);
        let summary = Pipeline::new(config, fake_dns)
            .run(&[&empty, &empty], Vec::new())
            .unwrap();
        assert_eq!(summary.records_written, 0);
    }
}

#[test]
fn slow_resolver_many_consumers_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.txt", "a b c d e f g h i j\n");
    let calls = AtomicUsize::new(0);
    let slow = |host: &str, mode: ResolutionMode| {
        calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        fake_dns(host, mode)
    };

    let config = LookupConfig::default()
        .with_queue_capacity(1)
        .with_resolver_threads(10);
    let summary = Pipeline::new(config, slow).run(&[input], Vec::new()).unwrap();

    assert_eq!(summary.records_written, 10);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[test]
fn raw_input_bytes_map_one_to_one_onto_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.txt");
    std::fs::write(&path, b"ab\xffcd.example\nfoo\xc2\xa0bar.example ok.example\n").unwrap();

    let mut out = Vec::new();
    let summary = Pipeline::new(LookupConfig::default().with_resolver_bounds(1, 1), fake_dns)
        .run(&[path], &mut out)
        .unwrap();

    // Three tokens: the non-breaking space does not split, the 0xff byte is kept.
    assert_eq!(summary.hostnames_read, 3);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.failed_lookups, 1);
    assert_eq!(
        out,
        b"ab\xffcd.example,\nfoo\xc2\xa0bar.example,192.0.2.1\nok.example,192.0.2.1\n"
    );
}

#[test]
fn too_many_inputs_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.txt", "x.example\n");
    let inputs = vec![input; 3];

    let err = Pipeline::new(LookupConfig::default().with_max_input_files(2), fake_dns)
        .run(&inputs, Vec::new())
        .unwrap_err();
    assert!(matches!(err, LookupError::TooManyInputs { count: 3, max: 2 }));
}

// ---------------------------------------------------------------------------
// Live DNS
// ---------------------------------------------------------------------------

#[test]
#[ignore = "requires live DNS"]
fn system_resolver_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "in.txt",
        "example.com\nlocalhost\nbad..name.invalid\n",
    );

    let mut out = Vec::new();
    let summary = Pipeline::new(LookupConfig::default(), SystemResolver::new())
        .run(&[input], &mut out)
        .unwrap();

    assert_eq!(summary.records_written, 3);
    let lines = lines(out);
    assert!(lines.contains(&"bad..name.invalid,".to_owned()));
    assert!(lines.iter().any(|l| l.starts_with("localhost,")));
}

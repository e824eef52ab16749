use super::*;
use std::io::Cursor;

fn frames(log: &str) -> Vec<Frame> {
    FrameReader::from_reader(Cursor::new(log))
        .collect::<ParticleVideoResult<Vec<_>>>()
        .unwrap()
}

#[test]
fn emits_one_frame_per_non_empty_block() {
    let log = "0\n1,1,0,0,0.1\n2,2,0,0,0.1\n0.5\n3,3,1,1,0.1\n1.0\n";
    let got = frames(log);
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].time, 0.0);
    assert_eq!(got[0].particles.len(), 2);
    assert_eq!(got[1].time, 0.5);
    assert_eq!(got[1].particles.len(), 1);
    assert_eq!(got[1].particles[0].x, 3.0);
}

#[test]
fn empty_blocks_are_dropped_anywhere() {
    let log = "0\n0.1\n0.2\n1,1,0,0,1\n0.3\n0.4\n";
    let got = frames(log);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].time, 0.2);
}

#[test]
fn blank_lines_and_surrounding_whitespace_are_ignored() {
    let log = "\n  0.0000  \n\n 1,2,3,4,5 \r\n\n\t\n";
    let got = frames(log);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].particles[0].r, 5.0);
}

#[test]
fn preserves_particle_order_and_times_as_written() {
    let log = "0\n1,0,0,0,1\n2,0,0,0,1\n3,0,0,0,1\n0.2\n4,0,0,0,1\n0.1\n5,0,0,0,1\n";
    let got = frames(log);
    let xs: Vec<f64> = got[0].particles.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    let times: Vec<f64> = got.iter().map(|f| f.time).collect();
    assert_eq!(times, vec![0.0, 0.2, 0.1]);
}

#[test]
fn signed_timestamps_open_blocks() {
    let got = frames("-1.5\n0,0,0,0,1\n+2\n0,0,0,0,1\n");
    assert_eq!(got[0].time, -1.5);
    assert_eq!(got[1].time, 2.0);
}

#[test]
fn empty_input_yields_no_frames() {
    assert!(frames("").is_empty());
    assert!(frames("\n\n").is_empty());
    assert!(frames("0\n1\n2\n").is_empty());
}

#[test]
fn malformed_line_fails_fast_with_line_number() {
    let mut it = FrameReader::from_reader(Cursor::new("0\n1,1,0,0,1\n\n1,1,zz,0,1\n1\n1,1,0,0,1\n"));
    let err = it.next().unwrap().unwrap_err();
    assert_eq!(err.line(), Some(4));
    assert!(err.to_string().contains("1,1,zz,0,1"));
    assert!(it.next().is_none());
}

#[test]
fn particle_before_first_timestamp_is_rejected() {
    let err = FrameReader::from_reader(Cursor::new("1,1,0,0,1\n0\n"))
        .next()
        .unwrap()
        .unwrap_err();
    assert_eq!(err.line(), Some(1));
}

#[test]
fn exponent_time_is_treated_as_a_particle_line() {
    let err = FrameReader::from_reader(Cursor::new("0\n1e-3\n"))
        .next()
        .unwrap()
        .unwrap_err();
    assert_eq!(err.line(), Some(2));
}

#[test]
fn reopening_a_file_restarts_the_stream() {
    let dir = std::path::PathBuf::from("target").join("reader_restart");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("log.txt");
    std::fs::write(&path, "0\n0,0,1,0,1\n1\n0,0,1,0,1\n").unwrap();

    let first: Vec<_> = FrameReader::open(&path).unwrap().map(|f| f.unwrap()).collect();
    let second: Vec<_> = FrameReader::open(&path).unwrap().map(|f| f.unwrap()).collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn missing_file_is_an_error() {
    assert!(FrameReader::open(Path::new("target/definitely/missing.txt")).is_err());
}

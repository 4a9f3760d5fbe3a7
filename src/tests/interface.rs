use flate2::{write::GzEncoder, Compression};

use std::{
    fs::File,
    io::{Cursor, Write},
    path::PathBuf,
};

use crate::prelude::{Error, Failure, Interface};

/// Writes a test file in the temporary directory
fn temp_file(name: &str, content: &[u8], gzip: bool) -> PathBuf {
    let path = std::env::temp_dir().join(format!("kinematic-rx-{}-{}", std::process::id(), name));
    let fd = File::create(&path).unwrap();

    if gzip {
        let mut encoder = GzEncoder::new(fd, Compression::new(5));
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap();
    } else {
        let mut fd = fd;
        fd.write_all(content).unwrap();
    }

    path
}

fn read_to_end(interface: &mut Interface) -> (Vec<u8>, Failure) {
    let mut buf = [0u8; 7];
    let mut content = Vec::new();

    loop {
        match interface.read_interface(&mut buf) {
            Ok(size) => content.extend_from_slice(&buf[..size]),
            Err(failure) => return (content, failure),
        }
    }
}

#[test]
fn in_memory_reader() {
    let mut interface = Interface::from_reader(Cursor::new(b"hello world".to_vec()));
    assert!(interface.is_read_only());
    assert!(!interface.is_serial_port());

    let (content, failure) = read_to_end(&mut interface);
    assert_eq!(content, b"hello world");
    assert_eq!(failure, Failure::EndOfData);
    assert!(failure.is_permanent());

    // end of data is sticky
    let mut buf = [0u8; 4];
    assert_eq!(interface.read_interface(&mut buf), Err(Failure::EndOfData));

    // writes are dropped
    assert!(interface.write_all(b"ignored").is_ok());
}

#[test]
fn stacked_plain_and_gzip_files() {
    let first = temp_file("first.txt", b"first file,", false);
    let second = temp_file("second.txt.gz", b"second file (compressed),", true);
    let third = temp_file("third.txt", b"third file", false);

    let mut interface = Interface::open_files(&[&first, &second, &third]).unwrap();

    let (content, failure) = read_to_end(&mut interface);

    assert_eq!(
        String::from_utf8(content).unwrap(),
        "first file,second file (compressed),third file"
    );

    assert_eq!(failure, Failure::EndOfData);

    for path in [first, second, third] {
        let _ = std::fs::remove_file(path);
    }
}

#[test]
fn no_input_files() {
    let paths: [PathBuf; 0] = [];
    assert!(matches!(Interface::open_files(&paths), Err(Error::NoInput)));
}

#[test]
fn missing_input_file() {
    let path = std::env::temp_dir().join("kinematic-rx-this-file-does-not-exist.ubx");
    assert!(matches!(Interface::open_files(&[path]), Err(Error::Io(_))));
}

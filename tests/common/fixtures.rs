//! Test fixtures - small stand-ins for the real release archives.

#![allow(dead_code)]

use std::io::Write;

/// Build a zip in memory. Names ending in '/' become directory entries.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// Build a gzip-compressed tarball in memory. Names ending in '/' become directories.
pub fn tar_gz_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        if name.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            builder.append_data(&mut header, name, std::io::empty()).unwrap();
        } else {
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn sqlite_zip() -> Vec<u8> {
    zip_archive(&[
        ("sqlite-amalgamation-3430000/", ""),
        ("sqlite-amalgamation-3430000/sqlite3.c", "/* amalgamation */"),
        ("sqlite-amalgamation-3430000/sqlite3.h", "#define SQLITE_VERSION \"3.43.0\""),
        ("sqlite-amalgamation-3430000/sqlite3ext.h", "/* ext */"),
        ("sqlite-amalgamation-3430000/shell.c", "int main(void) { return 0; }"),
    ])
}

pub fn openssl_tar_gz() -> Vec<u8> {
    tar_gz_archive(&[
        ("openssl-1.1.1i/", ""),
        ("openssl-1.1.1i/Configure", "#!/usr/bin/env perl"),
        ("openssl-1.1.1i/crypto/", ""),
        ("openssl-1.1.1i/crypto/mem.c", "/* mem */"),
        ("openssl-1.1.1i/include/openssl/ssl.h", "/* ssl */"),
    ])
}

pub fn gtest_zip() -> Vec<u8> {
    zip_archive(&[
        ("googletest-1.14.0/", ""),
        ("googletest-1.14.0/CMakeLists.txt", "project(googletest-distribution)"),
        ("googletest-1.14.0/googletest/", ""),
        ("googletest-1.14.0/googletest/include/gtest/gtest.h", "#pragma once"),
        ("googletest-1.14.0/googletest/src/gtest-all.cc", "// all"),
        ("googletest-1.14.0/googlemock/include/gmock/gmock.h", "#pragma once"),
    ])
}

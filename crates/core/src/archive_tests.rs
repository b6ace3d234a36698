// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const XZ_ROBOT: &str = "\
name\tcrash.tar.xz
file\t1\t1\t5468\t40960\t0.134\tCRC64\t0
totals\t1\t1\t5468\t40960\t0.134\tCRC64\t0\t1
";

const GZIP_LIST_OUT: &str = "\
         compressed        uncompressed  ratio uncompressed_name
               5302               20480  74.3% /tmp/crash.tar
";

const LS_LONG_OUT: &str = "-rw-r--r--. 1 retrace retrace 1536000 Oct 18 10:02 /tmp/crash.tar\n";

#[yare::parameterized(
    xz   = { ArchiveFormat::XzTar, XZ_ROBOT, 40960 },
    gzip = { ArchiveFormat::GzipTar, GZIP_LIST_OUT, 20480 },
    tar  = { ArchiveFormat::Tar, LS_LONG_OUT, 1536000 },
)]
fn golden_listing(format: ArchiveFormat, listing: &str, expected: u64) {
    assert_eq!(format.parse_unpacked_size(listing), Some(expected));
}

#[yare::parameterized(
    xz_empty     = { ArchiveFormat::XzTar, "" },
    xz_no_totals = { ArchiveFormat::XzTar, "name\tcrash.tar.xz\nfile\t1\t1\t5468\t40960\n" },
    gzip_header  = { ArchiveFormat::GzipTar, "         compressed        uncompressed  ratio uncompressed_name\n" },
    gzip_error   = { ArchiveFormat::GzipTar, "gzip: crash.tar.gz: not in gzip format\n" },
    tar_missing  = { ArchiveFormat::Tar, "ls: cannot access 'x': No such file or directory\n" },
)]
fn unmatched_listing_is_unknown(format: ArchiveFormat, listing: &str) {
    assert_eq!(format.parse_unpacked_size(listing), None);
}

#[test]
fn zero_byte_archive_is_known_zero() {
    let listing = "-rw-r--r-- 1 a b 0 Oct 18 10:02 empty.tar\n";
    assert_eq!(ArchiveFormat::Tar.parse_unpacked_size(listing), Some(0));
}

#[test]
fn content_type_dispatch() {
    assert_eq!(ArchiveFormat::from_content_type("application/x-gzip"), Ok(ArchiveFormat::GzipTar));
    assert_eq!(
        ArchiveFormat::from_content_type("application/x-xz-compressed-tar"),
        Ok(ArchiveFormat::XzTar)
    );
    assert_eq!(ArchiveFormat::from_content_type("application/x-tar"), Ok(ArchiveFormat::Tar));
    assert_eq!(
        ArchiveFormat::from_content_type("application/zip"),
        Err(UnsupportedFormatError("application/zip".to_string()))
    );
}

#[test]
fn commands_take_archive_as_single_argument() {
    let archive = Path::new("/tmp/with space.tar.gz");
    let unpack = ArchiveFormat::GzipTar.unpack_command(archive);
    assert_eq!(unpack.to_string(), "/bin/tar xzf /tmp/with space.tar.gz");
    assert_eq!(unpack.args.len(), 2);

    let size = ArchiveFormat::XzTar.size_command(archive);
    assert_eq!(size.to_string(), "/usr/bin/xz --list --robot /tmp/with space.tar.gz");
}

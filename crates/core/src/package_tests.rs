// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple     = { "bash-4.1.2-9.fc14.x86_64", "bash", "4.1.2", "9.fc14", "x86_64" },
    dashed     = { "glibc-common-2.12-1.el6.i686", "glibc-common", "2.12", "1.el6", "i686" },
    plain_rel  = { "coreutils-8.5-7.noarch", "coreutils", "8.5", "7", "noarch" },
    trailing   = { "zsh-5.0-1.fc20.x86_64\n", "zsh", "5.0", "1.fc20", "x86_64" },
)]
fn parses_nvra(input: &str, name: &str, version: &str, release: &str, arch: &str) {
    let nvra = Nvra::parse(input).unwrap();
    assert_eq!(nvra.name, name);
    assert_eq!(nvra.version, version);
    assert_eq!(nvra.release, release);
    assert_eq!(nvra.arch, arch);
}

#[yare::parameterized(
    no_arch    = { "bash-4.1.2-9" },
    no_release = { "bash-4.1.2.x86_64" },
    empty      = { "" },
    alpha_ver  = { "bash-beta-9.fc14.x86_64" },
)]
fn rejects_malformed_nvra(input: &str) {
    assert_eq!(Nvra::parse(input), None);
}

#[yare::parameterized(
    nvra      = { "bash-4.1.2-9.fc14.x86_64", true },
    plus      = { "libstdc++", true },
    space     = { "bash 4", false },
    quote     = { "bash'; rm -rf /", false },
    slash     = { "../etc/passwd", false },
    empty     = { "", false },
)]
fn package_name_validation(input: &str, valid: bool) {
    assert_eq!(is_valid_package_name(input), valid);
}

#[yare::parameterized(
    x86_64  = { "core: ELF 64-bit LSB core file x86-64, version 1 (SYSV)", Some("x86_64") },
    i386    = { "core: ELF 32-bit LSB core file Intel 80386, version 1", Some("i386") },
    arm     = { "core: ELF 64-bit LSB core file ARM aarch64", None },
)]
fn arch_from_file_output(output: &str, arch: Option<&str>) {
    assert_eq!(guess_arch(output), arch);
}

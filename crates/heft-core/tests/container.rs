//! Tests for container detection and symbol reading

mod common;

use std::path::Path;

use heft_core::container::{parsers, read_symbol_table};
use heft_core::error::HeftError;
use heft_core::types::ContainerFormat;
use object::BinaryFormat;

use crate::common::{object_file, relabel_symtab_as_dynsym, set_symbol_section_index};

const SYMBOLS: [(&str, u64); 3] = [("main.run", 10), ("runtime.gcStart", 5), ("github.com/x/y.Do", 20)];

fn names(data: &[u8]) -> Vec<String>
{
    let table = read_symbol_table(data, Path::new("fixture")).unwrap();
    table.symbols.into_iter().map(|symbol| symbol.name).collect()
}

#[test]
fn test_parser_priority_order()
{
    let formats: Vec<ContainerFormat> = parsers().iter().map(|parser| parser.format()).collect();
    assert_eq!(formats, [ContainerFormat::Elf, ContainerFormat::MachO, ContainerFormat::Pe]);
}

#[test]
fn test_elf_symbols_with_sizes()
{
    let data = object_file(BinaryFormat::Elf, &SYMBOLS, None);
    let table = read_symbol_table(&data, Path::new("fixture.o")).unwrap();

    assert_eq!(table.format, ContainerFormat::Elf);
    for (name, size) in SYMBOLS {
        let symbol = table.symbols.iter().find(|symbol| symbol.name == name).unwrap();
        assert_eq!(symbol.size, size);
        assert_eq!(symbol.section.as_deref(), Some(".text"));
        assert!(symbol.package.is_none());
    }
    assert!(table.sections.iter().any(|section| section.name == ".text"));
}

#[test]
fn test_macho_strips_c_prefix()
{
    let data = object_file(BinaryFormat::MachO, &SYMBOLS, None);
    let table = read_symbol_table(&data, Path::new("fixture.o")).unwrap();

    assert_eq!(table.format, ContainerFormat::MachO);
    let found = names(&data);
    for (name, _) in SYMBOLS {
        assert!(found.iter().any(|symbol| symbol == name), "missing {name} in {found:?}");
    }
    assert!(table.symbols.iter().all(|symbol| symbol.size == 0));
}

#[test]
fn test_coff_is_read_as_pe()
{
    let data = object_file(BinaryFormat::Coff, &SYMBOLS, None);
    let table = read_symbol_table(&data, Path::new("fixture.obj")).unwrap();

    assert_eq!(table.format, ContainerFormat::Pe);
    let found = names(&data);
    for (name, _) in SYMBOLS {
        assert!(found.iter().any(|symbol| symbol == name), "missing {name} in {found:?}");
    }
}

#[test]
fn test_empty_symbol_table_is_success()
{
    let data = object_file(BinaryFormat::Elf, &[], None);
    let table = read_symbol_table(&data, Path::new("empty.o")).unwrap();

    assert_eq!(table.format, ContainerFormat::Elf);
    assert!(table.is_empty());
}

#[test]
fn test_unrecognized_container()
{
    let result = read_symbol_table(b"#!/bin/sh\necho not a binary\n", Path::new("script.sh"));
    match result {
        Err(HeftError::UnrecognizedContainerFormat { path }) => assert_eq!(path, Path::new("script.sh")),
        other => panic!("Expected UnrecognizedContainerFormat, got {other:?}"),
    }
}

#[test]
fn test_truncated_container_is_unrecognized()
{
    let data = object_file(BinaryFormat::Elf, &SYMBOLS, None);
    let result = read_symbol_table(&data[..24], Path::new("truncated.o"));
    assert!(matches!(result, Err(HeftError::UnrecognizedContainerFormat { .. })));
}

#[test]
fn test_elf_dynamic_symbol_fallback()
{
    let mut data = object_file(BinaryFormat::Elf, &[("main.run", 10), ("runtime.x", 5)], None);
    relabel_symtab_as_dynsym(&mut data);

    let table = read_symbol_table(&data, Path::new("stripped.o")).unwrap();
    let found: Vec<(&str, u64)> = table
        .symbols
        .iter()
        .map(|symbol| (symbol.name.as_str(), symbol.size))
        .collect();
    assert_eq!(found, [("main.run", 10), ("runtime.x", 5)]);
}

#[test]
fn test_out_of_range_section_symbol_dropped()
{
    let mut data = object_file(BinaryFormat::Elf, &[("main.run", 10), ("runtime.x", 5)], None);
    set_symbol_section_index(&mut data, "main.run", 0x200);

    assert_eq!(names(&data), ["runtime.x"]);
}

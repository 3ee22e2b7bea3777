//! Tests for error handling

use std::io;
use std::path::PathBuf;

use heft_core::error::{HeftError, HeftResult};

#[test]
fn test_open_binary_display()
{
    let error = HeftError::OpenBinary {
        path: PathBuf::from("/tmp/app"),
        source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
    };
    let message = format!("{}", error);
    assert!(message.contains("/tmp/app"));
    assert!(message.contains("no such file"));
}

#[test]
fn test_missing_build_info_display()
{
    let error = HeftError::MissingBuildInfo {
        path: PathBuf::from("/tmp/app"),
        reason: "build-info magic not found".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("No Go build information"));
    assert!(message.contains("magic not found"));
}

#[test]
fn test_unrecognized_container_display()
{
    let error = HeftError::UnrecognizedContainerFormat {
        path: PathBuf::from("notes.txt"),
    };
    assert!(format!("{}", error).contains("not ELF, Mach-O or PE"));
}

#[test]
fn test_io_error_conversion()
{
    let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    let error: HeftError = io_err.into();

    match error {
        HeftError::Io(_) => {}
        _ => panic!("Expected Io variant"),
    }
}

#[test]
fn test_result_type()
{
    fn invalid() -> HeftResult<()>
    {
        Err(HeftError::InvalidConfig("bad".to_string()))
    }

    assert!(invalid().is_err());
    assert_eq!(format!("{}", invalid().unwrap_err()), "Invalid configuration: bad");
}

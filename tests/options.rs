mod common;

use common::{init_logging, RecordingToolchain, INJECTED_STATUS};
use gcu_backend::{build_options, OptionBuilder, ToolchainCall, ToolchainError};

#[test]
fn target_defaults_are_tokenized_and_pipeline_appended() {
    init_logging();
    let toolchain = RecordingToolchain::new("a-b- c -d");

    let options = build_options(&toolchain, "pavo").expect("options");

    assert_eq!(
        options.as_slice(),
        ["-a", "-b", "-c", "-d", "-hlir=tops-hlir-pipeline"]
    );
    assert_eq!(toolchain.last_target.borrow().as_deref(), Some("pavo"));
}

#[test]
fn empty_defaults_yield_only_pipeline_option() {
    let toolchain = RecordingToolchain::new("");
    let options = build_options(&toolchain, "pavo").expect("options");
    assert_eq!(options.into_vec(), vec!["-hlir=tops-hlir-pipeline"]);
}

#[test]
fn whitespace_only_defaults_yield_only_pipeline_option() {
    let toolchain = RecordingToolchain::new(" \t- \r\n -  ");
    let options = build_options(&toolchain, "pavo").expect("options");
    assert_eq!(options.len(), 1);
}

#[test]
fn padded_tokens_are_emitted_trimmed() {
    // The flags must come out without their padding, never as "- arch" or
    // an empty "-".
    let toolchain = RecordingToolchain::new("-  arch=gcu300  -\tO3\n");
    let options = build_options(&toolchain, "dorado").expect("options");
    assert_eq!(
        options.as_slice(),
        ["-arch=gcu300", "-O3", "-hlir=tops-hlir-pipeline"]
    );
}

#[test]
fn pipeline_option_stays_last() {
    let toolchain = RecordingToolchain::new("-hlir=other -O2");
    let builder = OptionBuilder::new().with_pipeline("custom-pipeline");
    let options = builder.build(&toolchain, "pavo").expect("options");
    assert_eq!(
        options.as_slice(),
        ["-hlir=other", "-O2", "-hlir=custom-pipeline"]
    );
    assert_eq!(options.to_string(), "-hlir=other -O2 -hlir=custom-pipeline");
}

#[test]
fn query_failure_is_reported_at_init_options() {
    let toolchain = RecordingToolchain::new("a").failing_at(ToolchainCall::InitOptions);
    let err = build_options(&toolchain, "pavo").unwrap_err();
    assert_eq!(
        err,
        ToolchainError::CallFailed {
            call: ToolchainCall::InitOptions,
            status: INJECTED_STATUS
        }
    );
}

#[test]
fn defaults_filling_the_buffer_are_truncation() {
    let toolchain = RecordingToolchain::new("-O3 -arch=gcu300");
    let builder = OptionBuilder::new().with_capacity(8);
    let err = builder.build(&toolchain, "pavo").unwrap_err();
    assert_eq!(err, ToolchainError::OptionsTruncated { capacity: 8 });
}

#[test]
fn defaults_one_byte_short_of_capacity_fit() {
    let toolchain = RecordingToolchain::new("-O3 -x");
    let builder = OptionBuilder::new().with_capacity(7);
    let options = builder.build(&toolchain, "pavo").expect("fits with terminator");
    assert_eq!(options.as_slice(), ["-O3", "-x", "-hlir=tops-hlir-pipeline"]);
}

#[test]
fn non_utf8_defaults_are_rejected() {
    let toolchain = RecordingToolchain::with_raw_defaults(vec![b'-', 0xff, 0xfe]);
    let err = build_options(&toolchain, "pavo").unwrap_err();
    assert_eq!(err, ToolchainError::OptionsEncoding);
}

#[test]
fn target_with_nul_never_reaches_toolchain() {
    let toolchain = RecordingToolchain::new("a");
    let err = build_options(&toolchain, "pa\0vo").unwrap_err();
    assert!(matches!(err, ToolchainError::InvalidTarget(_)));
    assert!(toolchain.calls().is_empty());
}

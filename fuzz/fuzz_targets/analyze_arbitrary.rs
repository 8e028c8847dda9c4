// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for analyzer crash safety.
//!
//! Arbitrary text is classified, scanned for sends and split into
//! statements. None of it may panic, and every send must lie on code
//! characters inside the text.

#![no_main]

use gemtalk_core::method_ast::build_method_ast;
use gemtalk_core::source_analysis::ClassifiedSource;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The analyzer takes &str; invalid UTF-8 never reaches it.
    if let Ok(source) = std::str::from_utf8(data) {
        let ast = build_method_ast(source);
        let classified = ClassifiedSource::new(source);
        for send in &ast.sends {
            assert!(send.end_offset <= source.len());
            assert!(classified.is_code(send.start_offset));
        }
        for pair in ast.statements.windows(2) {
            assert!(pair[0].end_offset <= pair[1].start_offset);
        }
    }
});

// The `unused_crate_dependencies` lint checks every crate in a package separately.
// See <https://github.com/rust-lang/rust/issues/57274>.
#![allow(unused_crate_dependencies)]

use features::{log, Feature};
use log::Level;

#[test]
fn feature_log_syntaxes_produce_correct_output() {
    testing_logger::setup();

    showcase();

    testing_logger::validate(|logs| {
        itertools::assert_equal(
            logs.iter().map(|log| (log.level, log.body.as_str())),
            [
                (Level::Info, "[DebugBlockProducer] using local payload for slot 3"),
                (Level::Info, "[DebugBlockProducer] using local payload for slot 4"),
                (Level::Info, "[DebugBlockProducer] using local payload for slot 3"),
                (Level::Info, "[DebugBlockProducer] using local payload for slot 4"),
                (Level::Warn, "[DebugBlockProducer] builder bid for slot 4 ignored"),
            ],
        );

        for log in logs {
            assert_eq!(log.target, "features");
        }
    });
}

fn showcase() {
    Feature::DebugBlockProducer.enable();

    if Feature::DebugBlockProducer.is_enabled() {
        Feature::DebugBlockProducer.log("using local payload for slot 3");
        Feature::DebugBlockProducer.log(format_args!("using local payload for slot {}", 2 + 2));
    }

    // This is a shorthand for the above.
    // The expressions used in the message are only evaluated if the feature is enabled.
    log!(DebugBlockProducer, "using local payload for slot 3");
    log!(DebugBlockProducer, "using local payload for slot {}", 2 + 2);

    // Using the full path may help avoid namespace clashes with `log::warn!`.
    features::warn!(DebugBlockProducer, "builder bid for slot {} ignored", 4);

    // Disabled features produce no output.
    features::log!(DebugBuilderApi, "this is never logged");
}

#![no_main]

use std::sync::mpsc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

use javelin_assist::{parse_for_completion, parse_for_selection, parse_skeleton, ParseMode};
use libfuzzer_sys::fuzz_target;

mod utils;

// Each input runs four parses.
const TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct WorkItem {
    input: String,
    caret: usize,
    end: usize,
}

struct Runner {
    input_tx: mpsc::SyncSender<WorkItem>,
    output_rx: Mutex<mpsc::Receiver<()>>,
}

fn runner() -> &'static Runner {
    static RUNNER: OnceLock<Runner> = OnceLock::new();
    RUNNER.get_or_init(|| {
        let (input_tx, input_rx) = mpsc::sync_channel::<WorkItem>(0);
        let (output_tx, output_rx) = mpsc::sync_channel::<()>(0);

        std::thread::spawn(move || {
            for work in input_rx {
                let input = work.input;
                for mode in [ParseMode::Diet, ParseMode::Method] {
                    let result = parse_for_completion(&input, work.caret, mode)
                        .expect("caret is a char boundary within the input");
                    if let Some(range) = result.replaced_range() {
                        assert!(range.end as usize <= work.caret);
                    }
                    let _ = result.unit_string();
                }

                let (start, end) = (work.caret.min(work.end), work.caret.max(work.end));
                let selection = parse_for_selection(&input, start, end)
                    .expect("selection is ordered and within the input");
                let _ = selection.parent_string();

                let _ = parse_skeleton(&input, Default::default());
                let _ = output_tx.send(());
            }
        });

        Runner {
            input_tx,
            output_rx: Mutex::new(output_rx),
        }
    })
}

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };
    let caret = utils::offset_in(text, data, 0);
    let end = utils::offset_in(text, data, 4);

    let runner = runner();
    runner
        .input_tx
        .send(WorkItem {
            input: text.to_owned(),
            caret,
            end,
        })
        .expect("assist worker thread exited");

    match runner
        .output_rx
        .lock()
        .expect("assist worker receiver poisoned")
        .recv_timeout(TIMEOUT)
    {
        Ok(()) => {}
        Err(mpsc::RecvTimeoutError::Timeout) => panic!("assist fuzz target timed out"),
        Err(mpsc::RecvTimeoutError::Disconnected) => panic!("assist worker thread panicked"),
    }
});

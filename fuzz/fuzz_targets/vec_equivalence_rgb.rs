#![no_main]
use libfuzzer_sys::fuzz_target;

use rgb_tree::model::{run_vec_equivalence, Op};

fuzz_target!(|ops: Vec<Op>| { run_vec_equivalence::<3>(ops) });

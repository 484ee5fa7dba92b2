#![no_main]

use libfuzzer_sys::fuzz_target;
use rtg_core::Catalog;

fuzz_target!(|word: u32| {
    let catalog = Catalog::rv32im();
    let Ok(decoded) = rtg_decode::instruction(catalog, word) else {
        return;
    };

    let encoded = rtg_encode::encoded(decoded.spec(), decoded.operands());
    assert_eq!(encoded.word(), word, "`{decoded}` re-encoded differently");
    assert_eq!(encoded, decoded);
});

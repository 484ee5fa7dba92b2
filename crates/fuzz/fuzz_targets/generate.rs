#![no_main]

use libfuzzer_sys::fuzz_target;
use rtg_core::Catalog;
use rtg_generate::{Generator, GeneratorConfig, PatternKind};

const KINDS: [PatternKind; 11] = [
    PatternKind::Random,
    PatternKind::Raw,
    PatternKind::War,
    PatternKind::Waw,
    PatternKind::LoadStore,
    PatternKind::BasicBlock,
    PatternKind::Mixed,
    PatternKind::Loop,
    PatternKind::Conditional,
    PatternKind::Function,
    PatternKind::Sequence,
];

fuzz_target!(|input: (u64, u8, u8, u8, u8)| {
    let (seed, kind, count, density, lookahead) = input;

    let config = GeneratorConfig {
        seed,
        lookahead: usize::from(lookahead % 16) + 1,
        ..GeneratorConfig::default()
    };

    let catalog = Catalog::rv32im();
    let generator = Generator::new(catalog, config).unwrap();
    let kind = KINDS[usize::from(kind) % KINDS.len()];

    let generation =
        generator.generate(kind, usize::from(count), f64::from(density) / 255.0).unwrap();

    assert_eq!(generation.len(), usize::from(count));
    for instruction in generation.instructions() {
        let decoded = rtg_decode::instruction(catalog, instruction.word()).unwrap();
        assert_eq!(&decoded, instruction);
    }
});

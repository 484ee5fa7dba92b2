use expect_test::expect;
use rtg_constraint::{
    InvalidConstraint, InvalidKind, Layer, OffsetRange, RegisterConstraint, Scope,
};
use rtg_core::{Catalog, Category, Class, DisplayDeferSlice, Format, InstructionSpec, Register, opcode};

use super::{Generation, Generator};
use crate::{
    CategoryWeights, GenerateError, GeneratorConfig, Hazard, HazardKind, LoadStoreConfig,
    PatternKind, PatternRecord, SequenceTemplate,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn generate(config: GeneratorConfig, kind: PatternKind, count: usize, density: f64) -> Generation<'static> {
    init_tracing();
    let generator = Generator::new(Catalog::rv32im(), config).unwrap();
    let generation = generator.generate(kind, count, density).unwrap();
    assert_eq!(generation.len(), count);
    generation
}

fn records(generation: &Generation<'_>, kind: PatternKind) -> Vec<PatternRecord> {
    let records: Vec<_> = generation.patterns().iter().copied().filter(|it| it.kind == kind).collect();
    assert!(!records.is_empty(), "no {kind} pattern was generated");
    records
}

fn check_hazards(generation: &Generation<'_>, lookahead: usize) {
    let instructions = generation.instructions();

    for hazard in generation.hazards() {
        let Hazard { kind, register, first, second } = *hazard;
        assert!(first < second && second - first <= lookahead, "{hazard:?}");
        assert!(!register.is_zero());

        let (a, b) = (&instructions[first], &instructions[second]);
        let holds = match kind {
            HazardKind::Raw => a.writes(register) && b.reads(register),
            HazardKind::War => a.reads(register) && b.writes(register),
            HazardKind::Waw => a.writes(register) && b.writes(register),
        };

        assert!(holds, "{hazard:?}: `{a}` then `{b}`");
        assert!(
            instructions[first + 1..second].iter().all(|it| !it.writes(register)),
            "{hazard:?} has an intervening writer"
        );

        if kind == HazardKind::War {
            assert!(
                instructions[first + 1..second].iter().all(|it| !it.reads(register)),
                "{hazard:?} has an intervening reader"
            );
        }
    }
}

#[test]
fn seeded_runs_repeat() {
    let config =
        GeneratorConfig { seed: 42, restriction: Some(Category::I), ..GeneratorConfig::default() };

    let first = generate(config.clone(), PatternKind::Random, 5, 0.0);
    let second = generate(config, PatternKind::Random, 5, 0.0);

    assert_eq!(first.instructions(), second.instructions());
    assert!(first.instructions().iter().all(|it| it.spec().format() == Format::I));
}

#[test]
fn category_weights() {
    let config =
        GeneratorConfig { weights: CategoryWeights::only(Category::I), ..GeneratorConfig::default() };

    let generation = generate(config, PatternKind::Random, 1000, 0.0);
    assert!(generation.instructions().iter().all(|it| it.spec().format() == Format::I));
}

#[test]
fn raw() {
    let generation = generate(GeneratorConfig::default(), PatternKind::Raw, 400, 1.0);

    assert!(!generation.hazards().is_empty());
    assert!(generation.hazards().iter().all(|it| it.kind == HazardKind::Raw));
    check_hazards(&generation, 8);
}

#[test]
fn war() {
    let generation = generate(GeneratorConfig::default(), PatternKind::War, 400, 1.0);

    assert!(!generation.hazards().is_empty());
    assert!(generation.hazards().iter().all(|it| it.kind == HazardKind::War));
    check_hazards(&generation, 8);
}

#[test]
fn war_across_seeds() {
    for seed in 0..20 {
        for kind in [PatternKind::War, PatternKind::Mixed] {
            let config = GeneratorConfig { seed, ..GeneratorConfig::default() };
            check_hazards(&generate(config, kind, 300, 0.8), 8);
        }
    }
}

#[test]
fn waw_with_short_window() {
    let config = GeneratorConfig { lookahead: 3, ..GeneratorConfig::default() };
    let generation = generate(config, PatternKind::Waw, 400, 1.0);

    assert!(!generation.hazards().is_empty());
    assert!(generation.hazards().iter().all(|it| it.kind == HazardKind::Waw));
    check_hazards(&generation, 3);
}

#[test]
fn load_store_window() {
    let config = GeneratorConfig {
        load_store: LoadStoreConfig {
            ranges: vec![OffsetRange::from_bounds(-100, 100)],
            allow_identical: false,
        },
        ..GeneratorConfig::default()
    };

    let generation = generate(config, PatternKind::LoadStore, 400, 1.0);
    let instructions = generation.instructions();

    for instruction in instructions {
        if instruction.spec().access_width().is_some() {
            let offset = instruction.operands().imm.unwrap();
            assert!((-100..=100).contains(&offset), "`{instruction}`");
        }

        let decoded = rtg_decode::instruction(Catalog::rv32im(), instruction.word()).unwrap();
        assert_eq!(&decoded, instruction);
    }

    for record in records(&generation, PatternKind::LoadStore) {
        let [load, store] = &instructions[record.start..record.start + record.len] else {
            panic!("{record:?} is not a pair");
        };

        assert_eq!(load.spec().class(), Class::Load);
        assert_eq!(store.spec().class(), Class::Store);

        let base = load.operands().rs1.unwrap();
        assert!(!base.is_zero());
        assert_eq!(store.operands().rs1, Some(base));
        assert_ne!(load.operands().rd, Some(base));
        assert_eq!(store.operands().rs2, load.operands().rd);
    }
}

#[test]
fn control_transfers_are_even() {
    let generation = generate(GeneratorConfig::default(), PatternKind::Random, 1000, 0.0);

    for instruction in generation.instructions() {
        if matches!(instruction.spec().format(), Format::B | Format::J) {
            assert_eq!(instruction.operands().imm.unwrap() % 2, 0, "`{instruction}`");
        }
    }
}

#[test]
fn basic_blocks() {
    let config = GeneratorConfig { block_size: 6, ..GeneratorConfig::default() };
    let generation = generate(config, PatternKind::BasicBlock, 300, 1.0);
    let instructions = generation.instructions();

    for record in records(&generation, PatternKind::BasicBlock) {
        assert!((1..=6).contains(&record.len));

        let block = &instructions[record.start..record.start + record.len];
        let (terminator, body) = block.split_last().unwrap();

        assert!(body.iter().all(|it| it.spec().is_straight_line()));
        assert!(matches!(terminator.spec().class(), Class::Branch | Class::Jal));

        let offset = terminator.operands().imm.unwrap();
        assert_eq!(offset % 4, 0);
        match offset < 0 {
            true => assert!((-offset / 4) as usize <= body.len()),
            false => assert!((1..=8).contains(&(offset / 4))),
        }
    }
}

#[test]
fn no_patterns_without_density() {
    let generation = generate(GeneratorConfig::default(), PatternKind::Mixed, 300, 0.0);

    assert!(generation.patterns().is_empty());
    assert!(generation.hazards().is_empty());
}

#[test]
fn mixed() {
    let generation = generate(GeneratorConfig::default(), PatternKind::Mixed, 500, 0.8);
    let allowed = [PatternKind::LoadStore, PatternKind::Raw, PatternKind::War, PatternKind::Waw];

    assert!(!generation.patterns().is_empty());
    assert!(generation.patterns().iter().all(|it| allowed.contains(&it.kind)));
    check_hazards(&generation, 8);
}

#[test]
fn counted_loops() {
    let generation = generate(GeneratorConfig::default(), PatternKind::Loop, 200, 1.0);
    let instructions = generation.instructions();

    for record in records(&generation, PatternKind::Loop) {
        let block = &instructions[record.start..record.start + record.len];
        let [init, body @ .., decrement, branch] = block else {
            panic!("{record:?} is too short");
        };

        let counter = init.operands().rd.unwrap();
        assert!(!counter.is_zero());
        assert_eq!(init.to_string(), format!("addi {counter}, x0, 16"));
        assert_eq!(decrement.to_string(), format!("addi {counter}, {counter}, -1"));

        let back = -4 * (body.len() as i32 + 1);
        assert_eq!(branch.to_string(), format!("bne {counter}, x0, {back}"));

        assert!(!body.is_empty());
        assert!(body.iter().all(|it| it.spec().is_straight_line() && !it.writes(counter)));
    }

    assert_eq!(generation.state().loop_depth(), 0);
}

#[test]
fn conditionals() {
    let generation = generate(GeneratorConfig::default(), PatternKind::Conditional, 200, 1.0);
    let instructions = generation.instructions();

    for record in records(&generation, PatternKind::Conditional) {
        let block = &instructions[record.start..record.start + record.len];
        let (branch, rest) = block.split_first().unwrap();
        assert_eq!(branch.spec().class(), Class::Branch);

        let skip = rest.iter().position(|it| it.spec().class() == Class::Jal).unwrap();
        let (then_block, else_block) = (&rest[..skip], &rest[skip + 1..]);
        assert!(!then_block.is_empty() && !else_block.is_empty());

        let jump = &rest[skip];
        assert_eq!(jump.operands().rd, Some(Register::ZERO));
        assert_eq!(jump.operands().imm, Some(4 * (else_block.len() as i32 + 1)));
        assert_eq!(branch.operands().imm, Some(4 * (then_block.len() as i32 + 2)));

        assert!(then_block.iter().chain(else_block).all(|it| it.spec().is_straight_line()));
    }
}

#[test]
fn functions() {
    let generation = generate(GeneratorConfig::default(), PatternKind::Function, 300, 1.0);
    let instructions = generation.instructions();

    for record in records(&generation, PatternKind::Function) {
        let block = &instructions[record.start..record.start + record.len];
        let len = block.len();

        assert_eq!(block[0].to_string(), "addi x2, x2, -16");
        assert_eq!(block[1].to_string(), "sw x1, 12(x2)");
        assert_eq!(block[len - 3].to_string(), "lw x1, 12(x2)");
        assert_eq!(block[len - 2].to_string(), "addi x2, x2, 16");
        assert_eq!(block[len - 1].to_string(), "jalr x0, 0(x1)");

        for (index, instruction) in block.iter().enumerate() {
            if index != 0 && index != len - 2 {
                assert!(!instruction.writes(Register::SP), "`{instruction}`");
            }

            if index != len - 3 {
                assert!(!instruction.writes(Register::RA), "`{instruction}`");
            }

            assert!(
                Register::ARGUMENTS.iter().all(|&it| !instruction.writes(it)),
                "`{instruction}` writes an argument register"
            );
        }
    }

    assert!(generation.state().frame().is_none());
}

fn sequence(json: &str) -> SequenceTemplate {
    serde_json::from_str(json).unwrap()
}

#[test]
fn fixed_sequence() {
    let template = sequence(
        r#"{
            "name": "materialize",
            "steps": [
                { "instructions": ["lui"], "rd": { "fixed": 5 }, "imm": { "fixed": 74565 } },
                {
                    "instructions": ["addi"],
                    "rd": { "fixed": 6 },
                    "rs1": { "fixed": 5 },
                    "imm": { "fixed": -1 }
                },
                {
                    "instructions": ["sw"],
                    "rs1": { "fixed": 2 },
                    "rs2": { "fixed": 6 },
                    "imm": { "fixed": 8 }
                }
            ]
        }"#,
    );

    let config = GeneratorConfig { sequences: vec![template], ..GeneratorConfig::default() };
    let generation = generate(config, PatternKind::Sequence, 3, 1.0);

    assert_eq!(
        generation.patterns(),
        [PatternRecord { kind: PatternKind::Sequence, start: 0, len: 3 }]
    );

    expect![[r#"
        lui x5, 74565
        addi x6, x5, -1
        sw x6, 8(x2)"#]]
    .assert_eq(&DisplayDeferSlice(generation.instructions()).to_string());
}

#[test]
fn sequence_variables() {
    let template = sequence(
        r#"{
            "name": "chain",
            "variables": ["v"],
            "steps": [
                {
                    "instructions": ["addi"],
                    "rd": { "different_from": ["v"] },
                    "rs1": { "variable": "v" },
                    "bind": { "v": "rd" }
                },
                {
                    "instructions": ["add", "sub"],
                    "rd": { "variable": "v" },
                    "rs1": { "variable": "v" },
                    "rs2": { "one_of": [10, 11] }
                }
            ]
        }"#,
    );

    let config = GeneratorConfig { sequences: vec![template], ..GeneratorConfig::default() };
    let generation = generate(config, PatternKind::Sequence, 40, 1.0);
    let instructions = generation.instructions();

    for record in records(&generation, PatternKind::Sequence) {
        let [first, second] = &instructions[record.start..record.start + record.len] else {
            panic!("{record:?} is not a pair");
        };

        let (first, second) = (first.operands(), second.operands());
        assert!(!first.rs1.unwrap().is_zero());
        assert_ne!(first.rd, first.rs1);
        assert_eq!(second.rd, first.rd);
        assert_eq!(second.rs1, first.rd);
        assert!(matches!(second.rs2, Some(Register::A0 | Register::A1)));
    }
}

#[test]
fn invalid_sequences() {
    let catalog = Catalog::rv32im();
    let with = |json: &str| {
        let config = GeneratorConfig { sequences: vec![sequence(json)], ..GeneratorConfig::default() };
        Generator::new(catalog, config).err()
    };

    assert_eq!(
        with(r#"{ "name": "s", "steps": [{ "instructions": ["nop"] }] }"#),
        Some(GenerateError::UnknownMnemonic("nop".to_owned()))
    );

    assert!(matches!(
        with(r#"{ "name": "s", "steps": [{ "instructions": ["add"], "rd": { "variable": "v" } }] }"#),
        Some(GenerateError::InvalidSequence { .. })
    ));

    assert!(matches!(
        with(r#"{ "name": "s", "steps": [{ "instructions": ["add"], "rd": { "fixed": 32 } }] }"#),
        Some(GenerateError::InvalidSequence { .. })
    ));

    assert!(matches!(
        with(r#"{ "name": "s", "steps": [] }"#),
        Some(GenerateError::InvalidSequence { .. })
    ));
}

#[test]
fn falls_back_to_random() {
    init_tracing();
    let catalog = Catalog::new([InstructionSpec::upper("lui", opcode::LUI)]).unwrap();
    let generator = Generator::new(&catalog, GeneratorConfig::default()).unwrap();

    let kinds = [
        PatternKind::Raw,
        PatternKind::War,
        PatternKind::LoadStore,
        PatternKind::BasicBlock,
        PatternKind::Loop,
        PatternKind::Conditional,
        PatternKind::Function,
        PatternKind::Sequence,
    ];

    for kind in kinds {
        let generation = generator.generate(kind, 20, 1.0).unwrap();
        assert_eq!(generation.len(), 20);
        assert!(generation.patterns().is_empty(), "{kind}");
        assert!(generation.instructions().iter().all(|it| it.mnemonic() == "lui"));
    }
}

#[test]
fn nothing_selectable() {
    let mut weights = CategoryWeights::only(Category::R);
    weights.set(Category::R, 0.0);

    let config = GeneratorConfig { weights, ..GeneratorConfig::default() };
    let generator = Generator::new(Catalog::rv32im(), config).unwrap();

    assert!(matches!(
        generator.generate(PatternKind::Random, 3, 0.0),
        Err(GenerateError::NoSelectableInstruction(_))
    ));
}

#[test]
fn register_constraints_apply() {
    let mut config = GeneratorConfig::default();
    config.constraints.global.rd =
        RegisterConstraint { allowed: Some(vec![5, 6, 7]), ..RegisterConstraint::default() };

    let generation = generate(config, PatternKind::Random, 500, 0.0);

    for instruction in generation.instructions() {
        if let Some(rd) = instruction.operands().rd {
            assert!((5..=7).contains(&rd.get()), "`{instruction}`");
        }
    }
}

#[test]
fn invalid_configuration() {
    let catalog = Catalog::rv32im();

    let mut config = GeneratorConfig::default();
    config.constraints.overrides.insert("nope".to_owned(), Layer::default());
    assert_eq!(
        Generator::new(catalog, config).err(),
        Some(GenerateError::InvalidConstraint(InvalidConstraint::new(
            Scope::Override("nope".to_owned()),
            InvalidKind::UnknownInstruction("nope".to_owned()),
        )))
    );

    let mut config = GeneratorConfig::default();
    config.constraints.global.rs1 =
        RegisterConstraint { min: Some(10), max: Some(5), ..RegisterConstraint::default() };
    assert!(matches!(
        Generator::new(catalog, config).err(),
        Some(GenerateError::InvalidConstraint(InvalidConstraint { scope: Scope::Global, .. }))
    ));

    let mut config = GeneratorConfig::default();
    config.load_store.ranges.clear();
    assert!(matches!(
        Generator::new(catalog, config).err(),
        Some(GenerateError::InvalidConstraint(InvalidConstraint { scope: Scope::LoadStore, .. }))
    ));

    let config = GeneratorConfig { lookahead: 0, ..GeneratorConfig::default() };
    assert!(matches!(Generator::new(catalog, config).err(), Some(GenerateError::InvalidConfig(_))));

    let mut weights = CategoryWeights::default();
    weights.set(Category::U, -2.0);
    let config = GeneratorConfig { weights, ..GeneratorConfig::default() };
    assert!(matches!(
        Generator::new(catalog, config).err(),
        Some(GenerateError::InvalidConstraint(InvalidConstraint {
            scope: Scope::CategoryWeights,
            ..
        }))
    ));
}

#[test]
fn deserialize_config() {
    let config: GeneratorConfig = serde_json::from_str(
        r#"{
            "seed": 42,
            "weights": { "r": 0.0, "b": 2.5 },
            "restriction": "i",
            "lookahead": 4,
            "load_store": { "ranges": [{ "base": -100, "size": 201 }] },
            "mixed": ["raw", "load-store", "basic-block"],
            "constraints": { "global": { "rd": { "exclude_zero": true } } }
        }"#,
    )
    .unwrap();

    assert_eq!(config.seed, 42);
    assert_eq!(config.weights.get(Category::R), 0.0);
    assert_eq!(config.weights.get(Category::B), 2.5);
    assert_eq!(config.weights.get(Category::Special), 1.0);
    assert_eq!(config.restriction, Some(Category::I));
    assert_eq!(config.lookahead, 4);
    assert_eq!(config.block_size, 8);
    assert_eq!(config.load_store.ranges, [OffsetRange::from_bounds(-100, 100)]);
    assert_eq!(config.mixed, [PatternKind::Raw, PatternKind::LoadStore, PatternKind::BasicBlock]);
    assert_eq!(config.constraints.global.rd.exclude_zero, Some(true));

    let unknown = serde_json::from_str::<GeneratorConfig>(r#"{ "density": 0.5 }"#);
    assert!(unknown.is_err());
}

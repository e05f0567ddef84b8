use nloc_algebra::{
    generate_measurements, generate_operators, projective_measurement_constraints, Expr, Monomial,
    Party, Substitutions, Symbol, SymbolTable,
};
use nloc_relax::{get_factorization_constraints, FactorizationOpts, Moments};

fn single_operator_parties() -> Vec<Party> {
    vec![
        vec![generate_operators("A", 1)],
        vec![generate_operators("B", 1)],
    ]
}

fn table(parties: &[Party]) -> SymbolTable {
    SymbolTable::from_symbols(parties.iter().flatten().flatten())
}

fn mono(text: &str, table: &SymbolTable) -> Monomial {
    Monomial::parse(text, table).expect("monomial")
}

fn rendered(constraints: &std::collections::BTreeMap<Monomial, Expr>) -> Vec<(String, String)> {
    constraints
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn bilocal_pair_uses_one_column_for_first_party() {
    let parties = single_operator_parties();
    let built = get_factorization_constraints(
        &parties,
        &Moments::new(),
        &Substitutions::new(),
        1,
        FactorizationOpts::default(),
    )
    .expect("constraints");

    assert_eq!(built.extra_columns, vec![Symbol::commuting("a_")]);
    assert!(built.column_names.is_none());

    let table = table(&parties);
    let ab = mono("A*B", &table);
    let a_b = &Expr::Symbol(Symbol::commuting("a_")) * &Expr::Symbol(Symbol::operator("B"));
    assert!(built.constraints[&ab].algebraic_eq(&a_b));
    assert_eq!(built.constraints[&ab].to_string(), "a_*B");

    let a = mono("A", &table);
    assert_eq!(built.constraints[&a], Expr::Symbol(Symbol::commuting("a_")));
    assert_eq!(built.constraints.len(), 3);
}

#[test]
fn no_entry_maps_a_monomial_to_itself() {
    let parties = single_operator_parties();
    let built = get_factorization_constraints(
        &parties,
        &Moments::new(),
        &Substitutions::new(),
        2,
        FactorizationOpts::default(),
    )
    .expect("constraints");
    assert!(!built.constraints.is_empty());
    for (key, value) in &built.constraints {
        assert!(!Expr::from(key).algebraic_eq(value), "vacuous entry {key}");
    }
}

#[test]
fn projective_scenario_resolves_known_moments() {
    let parties = vec![
        generate_measurements(&[2, 2], "A"),
        generate_measurements(&[2], "B"),
    ];
    let subs = projective_measurement_constraints(&parties).expect("rules");
    let table = table(&parties);
    let mut moments = Moments::new();
    moments.insert(mono("A0", &table), Expr::real(0.5));

    let built = get_factorization_constraints(
        &parties,
        &moments,
        &subs,
        1,
        FactorizationOpts {
            all_parties: false,
            return_column_names: true,
        },
    )
    .expect("constraints");

    assert_eq!(built.extra_columns, vec![Symbol::commuting("a_1")]);
    assert_eq!(built.column_names, Some(vec![mono("A1", &table)]));

    let a1_col = Expr::Symbol(Symbol::commuting("a_1"));
    let constraints = &built.constraints;
    assert_eq!(constraints.len(), 6);
    assert_eq!(constraints[&mono("A0", &table)], Expr::real(0.5));
    assert_eq!(constraints[&mono("A1", &table)], a1_col);
    assert_eq!(constraints[&mono("A0*B0", &table)].to_string(), "0.5*B0");
    assert_eq!(constraints[&mono("A1*B0", &table)].to_string(), "a_1*B0");
    let a1_squared = Monomial::from_symbols([Symbol::commuting("a_1"), Symbol::commuting("a_1")]);
    let key = Monomial::from_symbol(Symbol::commuting("a_1")).product(&mono("A1", &table));
    assert!(constraints[&key].algebraic_eq(&Expr::from(a1_squared)));
    // A0*A1 exceeds the per-party bound at level 1.
    assert!(!constraints.contains_key(&mono("A0*A1", &table)));
}

#[test]
fn all_parties_adds_columns_for_the_last_party() {
    let parties = single_operator_parties();
    let built = get_factorization_constraints(
        &parties,
        &Moments::new(),
        &Substitutions::new(),
        1,
        FactorizationOpts {
            all_parties: true,
            return_column_names: true,
        },
    )
    .expect("constraints");

    assert_eq!(
        built.extra_columns,
        vec![Symbol::commuting("a_"), Symbol::commuting("b_")]
    );
    let names: Vec<String> = built
        .column_names
        .expect("names")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, ["A", "B"]);

    let table = table(&parties);
    assert_eq!(built.constraints[&mono("A*B", &table)].to_string(), "a_*b_");
    assert_eq!(
        built.constraints[&mono("B", &table)],
        Expr::Symbol(Symbol::commuting("b_"))
    );
}

#[test]
fn fully_known_party_needs_no_columns() {
    let parties = single_operator_parties();
    let table = table(&parties);
    let mut moments = Moments::new();
    moments.insert(mono("A", &table), Expr::real(0.5));
    moments.insert(mono("B", &table), Expr::real(0.25));
    let built = get_factorization_constraints(
        &parties,
        &moments,
        &Substitutions::new(),
        1,
        FactorizationOpts::default(),
    )
    .expect("constraints");
    assert!(built.extra_columns.is_empty());
    assert_eq!(built.constraints[&mono("A*B", &table)], Expr::real(0.125));
    let rendered = rendered(&built.constraints);
    assert!(rendered.contains(&("A".to_string(), "0.5".to_string())));
}

#[test]
fn invalid_inputs_are_reported() {
    let parties = single_operator_parties();
    let err = get_factorization_constraints(
        &parties,
        &Moments::new(),
        &Substitutions::new(),
        0,
        FactorizationOpts::default(),
    )
    .expect_err("level zero");
    assert_eq!(err.code(), "invalid-level");

    let err = get_factorization_constraints(
        &[],
        &Moments::new(),
        &Substitutions::new(),
        1,
        FactorizationOpts::default(),
    )
    .expect_err("no parties");
    assert_eq!(err.code(), "empty-parties");

    let clashing = vec![
        vec![generate_operators("A", 1)],
        vec![generate_operators("Alt", 1)],
        vec![generate_operators("B", 1)],
    ];
    let err = get_factorization_constraints(
        &clashing,
        &Moments::new(),
        &Substitutions::new(),
        1,
        FactorizationOpts::default(),
    )
    .expect_err("prefix clash");
    assert_eq!(err.code(), "column-collision");
    assert_eq!(err.info().context.get("prefix").map(String::as_str), Some("a_"));
}

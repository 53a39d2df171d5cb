use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["carpool-cli", "migrate"]).expect("expected valid cli args");

    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn parses_search_command_with_radius() {
    let cli = Cli::try_parse_from([
        "carpool-cli",
        "search",
        "--zip",
        "10115",
        "--city",
        "Berlin",
        "--radius",
        "25",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Search { zip, city, radius }) => {
            assert_eq!(zip, "10115");
            assert_eq!(city, "Berlin");
            assert_eq!(radius, Some(25));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn search_requires_zip_and_city() {
    assert!(Cli::try_parse_from(["carpool-cli", "search", "--city", "Berlin"]).is_err());
}

#[test]
fn parses_suggest_command() {
    let cli = Cli::try_parse_from(["carpool-cli", "suggest", "Alexanderplatz"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Suggest { ref query }) if query == "Alexanderplatz"
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["carpool-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn zero_radius_builds_text_only_query() {
    let query = build_query(" 10115 ", "Berlin", Some(0)).expect("query");
    assert_eq!(query.radius_km(), 0);
    assert_eq!(query.address().zip_code, "10115");
}

#[test]
fn default_radius_is_five() {
    let query = build_query("10115", "Berlin", None).expect("query");
    assert_eq!(query.radius_km(), 5);
}

#[test]
fn out_of_range_radius_is_rejected() {
    let err = build_query("10115", "Berlin", Some(101)).unwrap_err();
    assert!(err.to_string().contains("radius"));
}

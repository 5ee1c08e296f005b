use crate::{command::assert_cmd_snapshot, freq};

fn fmt() -> crate::command::Command {
    freq(["fmt"])
}

#[test]
fn canonical() {
    assert_cmd_snapshot!(
        fmt().args(["F3M/Y", "FT10S/H", "F1D/W15D"]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    F3M
    FT10S/h
    F15D1D/W

    ----- stderr -----
    ",
    );
}

#[test]
fn rule_map() {
    assert_cmd_snapshot!(
        fmt().arg(r#"{"day": {"week": 3}, "hour": 10, "minute": 0}"#),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    F3D/WT10H0M

    ----- stderr -----
    ",
    );
    assert_cmd_snapshot!(
        fmt().stdin("{\"week\": \"odd\"}\nF(odd)W\n"),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    F(odd)W
    F(odd)W

    ----- stderr -----
    ",
    );
}

#[test]
fn surrounding_whitespace() {
    assert_cmd_snapshot!(
        fmt().args(["  F1D/W15D ", "\t{\"hour\": 10} "]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    F15D1D/W
    FT10H

    ----- stderr -----
    ",
    );
    assert_cmd_snapshot!(
        fmt().stdin(" FT10S/H\r\n  {\"week\": \"odd\"}  \n"),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    FT10S/h
    F(odd)W

    ----- stderr -----
    ",
    );
}

#[test]
fn json() {
    assert_cmd_snapshot!(
        fmt().args(["--json", "F1D/WT15H"]),
        @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {"frequency":"F1D/WT15H","rules":[{"scope":"week","unit":"day","value":1},{"scope":"day","unit":"hour","value":15}]}

    ----- stderr -----
    "#,
    );
}

#[test]
fn invalid() {
    assert_cmd_snapshot!(
        fmt().arg("F1D1D"),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    invalid frequency: malformed frequency `F1D1D`: day within month is given more than once
    ",
    );
    assert_cmd_snapshot!(
        fmt().arg("F1D/WT"),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    invalid frequency: malformed frequency `F1D/WT`: `T` must be followed by a time
    ",
    );
}

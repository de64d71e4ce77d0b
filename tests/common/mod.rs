//! Shared fixtures: a scripted stand-in for `ispell -a`.

use identspell::EngineOptions;

/// Knows every word except `colr`, `teh` and `xyzzy`. Extra arguments
/// (`-C`, `-W3`, `-p <file>`) are ignored.
pub const FAKE_ISPELL: &str = r#"
echo '@(#) International Ispell Version 3.4.05 (test double)'
while IFS= read -r line; do
  case "$line" in
    "^"*)
      word=${line#?}
      case "$word" in
        colr) printf '& colr 2 0: color, colour\n\n' ;;
        teh) printf '& teh 1 0: the\n\n' ;;
        xyzzy) printf '# xyzzy 0\n\n' ;;
        *) printf '*\n\n' ;;
      esac
      ;;
  esac
done
"#;

pub fn fake_engine() -> EngineOptions {
    EngineOptions {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), FAKE_ISPELL.to_string()],
        ..Default::default()
    }
}

//! `traits` command: list the catalog.

use colored::Colorize;

use sonotype_spec::TRAITS;

/// Prints the trait catalog.
pub fn run() {
    println!("{}", "Trait catalog".cyan().bold());
    for t in TRAITS {
        println!(
            "  {:<26} {:<12} {} / {}",
            t.key.green(),
            t.name,
            t.poles[0].dimmed(),
            t.poles[1].dimmed()
        );
        println!("      {}", t.description);
        println!("      {} {}", "music:".dimmed(), t.music_hint);
    }
}

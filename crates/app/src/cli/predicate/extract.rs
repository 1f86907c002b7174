use catalogue_predicates::catalogue::{catalogue_from_predicate, extract_catalogue_from_predicate};
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct ExtractArgs {
    /// Stored predicate JSON
    predicate: String,

    /// Fail unless the predicate has the shape catalogue edits produce
    #[arg(long)]
    strict: bool,
}

pub(crate) fn run(args: ExtractArgs) -> Result<(), String> {
    let predicate = super::parse(&args.predicate)?;

    let catalogue = if args.strict {
        catalogue_from_predicate(&predicate)
            .map_err(|error| format!("predicate is not catalogue shaped: {error}"))?
    } else {
        extract_catalogue_from_predicate(&predicate)
    };

    super::print(&catalogue)
}

use catalogue_predicates::predicates::{CataloguePredicate, clean_predicate};
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct NormalizeArgs {
    /// Raw predicate JSON
    predicate: String,

    /// Also check the result is a valid catalogue predicate
    #[arg(long)]
    catalogue: bool,
}

pub(crate) fn run(args: NormalizeArgs) -> Result<(), String> {
    let raw = super::parse(&args.predicate)?;

    let cleaned =
        clean_predicate(&raw, None).map_err(|error| format!("invalid predicate: {error}"))?;

    if args.catalogue {
        CataloguePredicate::try_from(&cleaned)
            .map_err(|error| format!("invalid catalogue predicate: {error}"))?;
    }

    super::print(&cleaned)
}

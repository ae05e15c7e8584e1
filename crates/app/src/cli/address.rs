use clap::Args;
use sacola::address::{Address, AddressField, PostalCode};
use sacola_app::{
    context::AppContext,
    domain::addresses::{LookupOutcome, prefill_address},
};

#[derive(Debug, Args)]
pub(crate) struct CepArgs {
    /// Postal code, with or without punctuation
    code: String,
}

#[derive(Debug, Args)]
pub(crate) struct AddressArgs {
    /// Recipient name
    #[arg(long)]
    recipient: Option<String>,

    /// Postal code; street, district, city and state are looked up from it
    #[arg(long)]
    cep: Option<String>,

    /// Street
    #[arg(long)]
    street: Option<String>,

    /// House number
    #[arg(long)]
    number: Option<String>,

    /// Complement, e.g. apartment
    #[arg(long)]
    complement: Option<String>,

    /// District
    #[arg(long)]
    district: Option<String>,

    /// City
    #[arg(long)]
    city: Option<String>,

    /// State
    #[arg(long)]
    state: Option<String>,
}

impl AddressArgs {
    fn is_empty(&self) -> bool {
        self.recipient.is_none()
            && self.cep.is_none()
            && self.street.is_none()
            && self.number.is_none()
            && self.complement.is_none()
            && self.district.is_none()
            && self.city.is_none()
            && self.state.is_none()
    }

    /// Typed values win over the looked-up ones.
    fn apply_typed(&self, address: &mut Address) {
        let typed = [
            (&self.recipient, &mut address.recipient),
            (&self.street, &mut address.street),
            (&self.number, &mut address.number),
            (&self.district, &mut address.district),
            (&self.city, &mut address.city),
            (&self.state, &mut address.state),
        ];

        for (value, field) in typed {
            if let Some(value) = value {
                value.clone_into(field);
            }
        }

        if let Some(complement) = &self.complement {
            address.complement = Some(complement.clone()).filter(|value| !value.trim().is_empty());
        }
    }
}

pub(crate) fn print_address(address: &Address) {
    for field in AddressField::REQUIRED {
        println!("{field}: {}", address.field(field));
    }

    if let Some(complement) = &address.complement {
        println!("complement: {complement}");
    }
}

pub(crate) async fn cep(ctx: &AppContext, args: CepArgs) -> Result<(), String> {
    let code = PostalCode::parse(&args.code).map_err(|error| format!("invalid postal code: {error}"))?;

    let found = ctx
        .postal
        .lookup(&code)
        .await
        .map_err(|error| format!("failed to look up postal code: {error}"))?
        .ok_or_else(|| format!("postal code {code} not found"))?;

    println!("street: {}", found.street);
    println!("district: {}", found.district);
    println!("city: {}", found.city);
    println!("state: {}", found.state);

    Ok(())
}

pub(crate) async fn run(ctx: &AppContext, args: AddressArgs) -> Result<(), String> {
    let saved = match ctx.addresses.fetch_address(ctx.user).await {
        Ok(address) => Some(address),
        Err(error) if error.is_not_found() => None,
        Err(error) => return Err(format!("failed to load address: {error}")),
    };

    if args.is_empty() {
        match saved {
            Some(address) => print_address(&address),
            None => println!("no saved address"),
        }

        return Ok(());
    }

    let mut address = saved.unwrap_or_default();

    if let Some(cep) = &args.cep {
        cep.clone_into(&mut address.postal_code);

        match prefill_address(ctx.postal.as_ref(), &mut address).await {
            LookupOutcome::Filled | LookupOutcome::Skipped => {}
            LookupOutcome::InvalidCode => eprintln!("postal code {cep} not found"),
            LookupOutcome::Failed(error) => eprintln!("postal code lookup failed: {error}"),
        }
    }

    args.apply_typed(&mut address);

    let missing = address.missing_fields();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();

        return Err(format!("address is missing: {}", names.join(", ")));
    }

    let saved = ctx
        .addresses
        .save_address(ctx.user, &address)
        .await
        .map_err(|error| format!("failed to save address: {error}"))?;

    print_address(&saved);

    Ok(())
}

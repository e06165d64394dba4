//! Storefront back-office CLI

use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::{Span, Timestamp};
use storefront_app::{
    context::{AppConfig, AppContext},
    domain::{
        catalog::data::{NewProduct, Page, ProductFilter},
        catalog::records::ProductUuid,
        checkout::CheckoutConfig,
        discounts::data::NewDiscount,
        discounts::records::DiscountUuid,
        shipping::data::NewShippingMethod,
        shipping::records::ShippingMethodUuid,
    },
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storefront-app", about = "Storefront back-office CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Product(ProductCommand),
    Discount(DiscountCommand),
    ShippingMethod(ShippingMethodCommand),
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    Create(CreateProductArgs),
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Product display name
    #[arg(long)]
    name: String,

    /// List price in cents
    #[arg(long)]
    price: u64,

    /// Initial stock
    #[arg(long, default_value_t = 0)]
    stock: u64,

    /// Sale price in cents; also flags the product as on sale
    #[arg(long)]
    sale_price: Option<u64>,

    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct DiscountCommand {
    #[command(subcommand)]
    command: DiscountSubcommand,
}

#[derive(Debug, Subcommand)]
enum DiscountSubcommand {
    Create(CreateDiscountArgs),
}

#[derive(Debug, Args)]
struct CreateDiscountArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Code customers type in
    #[arg(long)]
    code: String,

    /// Percentage off, 1..=100
    #[arg(long)]
    percentage: u8,

    /// Days of validity starting now
    #[arg(long, default_value_t = 30)]
    valid_for_days: i64,
}

#[derive(Debug, Args)]
struct ShippingMethodCommand {
    #[command(subcommand)]
    command: ShippingMethodSubcommand,
}

#[derive(Debug, Subcommand)]
enum ShippingMethodSubcommand {
    Create(CreateShippingMethodArgs),
}

#[derive(Debug, Args)]
struct CreateShippingMethodArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Method display name
    #[arg(long)]
    name: String,

    /// Delivery fee in cents
    #[arg(long)]
    price: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportTable {
    Products,
    Discounts,
    ShippingMethods,
    Purchases,
}

#[derive(Debug, Args)]
struct ExportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Table to dump as JSON on stdout
    #[arg(long, value_enum)]
    table: ExportTable,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn context(common: &CommonArgs) -> Result<AppContext, String> {
    // The CLI never drives a checkout, so gateway and mailer stay
    // unconfigured and the return URLs are placeholders.
    AppContext::from_config(AppConfig {
        database_url: common.database_url.clone(),
        stripe_secret_key: None,
        mailer: None,
        checkout: CheckoutConfig {
            success_url: "http://localhost/payment_success".to_string(),
            cancel_url: "http://localhost/payment_cancel".to_string(),
        },
    })
    .await
    .map_err(|error| format!("failed to initialise application: {error}"))
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Product(ProductCommand {
            command: ProductSubcommand::Create(args),
        }) => create_product(args).await,
        Commands::Discount(DiscountCommand {
            command: DiscountSubcommand::Create(args),
        }) => create_discount(args).await,
        Commands::ShippingMethod(ShippingMethodCommand {
            command: ShippingMethodSubcommand::Create(args),
        }) => create_shipping_method(args).await,
        Commands::Export(args) => export(args).await,
    }
}

async fn create_product(args: CreateProductArgs) -> Result<(), String> {
    let ctx = context(&args.common).await?;

    let product = ctx
        .catalog
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            name: args.name,
            description: args.description,
            price: args.price,
            on_sale: args.sale_price.is_some(),
            sale_price: args.sale_price,
            stock: args.stock,
            category_uuid: None,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("name: {}", product.name);
    println!("current_price: {}", product.current_price());
    println!("stock: {}", product.stock);

    Ok(())
}

async fn create_discount(args: CreateDiscountArgs) -> Result<(), String> {
    if args.percentage == 0 || args.percentage > 100 {
        return Err("percentage must be between 1 and 100".to_string());
    }

    let ctx = context(&args.common).await?;

    let now = Timestamp::now();
    let ends_at = now
        .checked_add(Span::new().hours(args.valid_for_days * 24))
        .map_err(|error| format!("invalid validity window: {error}"))?;

    let discount = ctx
        .discounts
        .create_discount(NewDiscount {
            uuid: DiscountUuid::new(),
            code: args.code,
            percentage: args.percentage,
            starts_at: now,
            ends_at,
        })
        .await
        .map_err(|error| format!("failed to create discount: {error}"))?;

    println!("discount_uuid: {}", discount.uuid);
    println!("code: {}", discount.code);
    println!("percentage: {}", discount.percentage);
    println!("ends_at: {}", discount.ends_at);

    Ok(())
}

async fn create_shipping_method(args: CreateShippingMethodArgs) -> Result<(), String> {
    let ctx = context(&args.common).await?;

    let method = ctx
        .shipping
        .create_method(NewShippingMethod {
            uuid: ShippingMethodUuid::new(),
            name: args.name,
            price: args.price,
        })
        .await
        .map_err(|error| format!("failed to create shipping method: {error}"))?;

    println!("shipping_method_uuid: {}", method.uuid);
    println!("name: {}", method.name);
    println!("price: {}", method.price);

    Ok(())
}

async fn export(args: ExportArgs) -> Result<(), String> {
    let ctx = context(&args.common).await?;

    let json = match args.table {
        ExportTable::Products => {
            let page = ctx
                .catalog
                .list_products(
                    ProductFilter::default(),
                    Page {
                        number: 1,
                        per_page: 10_000,
                    },
                )
                .await
                .map_err(|error| format!("failed to list products: {error}"))?;

            serde_json::to_string_pretty(&page.items)
        }
        ExportTable::Discounts => {
            let discounts = ctx
                .discounts
                .list_discounts()
                .await
                .map_err(|error| format!("failed to list discounts: {error}"))?;

            serde_json::to_string_pretty(&discounts)
        }
        ExportTable::ShippingMethods => {
            let methods = ctx
                .shipping
                .list_methods()
                .await
                .map_err(|error| format!("failed to list shipping methods: {error}"))?;

            serde_json::to_string_pretty(&methods)
        }
        ExportTable::Purchases => {
            let purchases = ctx
                .purchases
                .list_all()
                .await
                .map_err(|error| format!("failed to list purchases: {error}"))?;

            serde_json::to_string_pretty(&purchases)
        }
    }
    .map_err(|error| format!("failed to serialise export: {error}"))?;

    println!("{json}");

    Ok(())
}

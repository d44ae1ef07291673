//! BookSwap - swap physical books with other readers from the terminal
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use bookswap::api::SupabaseClient;
use bookswap::config::Config;
use bookswap::exchange;
use bookswap::models::{BookCondition, ExchangeStatus};
use bookswap::pages::auth::{self, Credentials};
use bookswap::pages::my_books::BookForm;
use bookswap::pages::{books, exchange_modal, matches, my_books};
use bookswap::session::{SessionStore, SessionVault};

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    match parse_args()? {
        Command::Run { path } => bookswap::app::run(path.as_deref()),
        Command::Demo => bookswap::app::run_demo(),
        Command::Login { email } => block_on(login(&email)),
        Command::Signup { email, username } => block_on(signup(&email, &username)),
        Command::Logout => block_on(logout()),
        Command::Whoami => block_on(whoami()),
        Command::Books { search, genre } => block_on(list_books(search, genre)),
        Command::MyBooks => block_on(list_my_books()),
        Command::AddBook(form) => block_on(add_book(form)),
        Command::Request {
            book,
            offer,
            message,
        } => block_on(request_exchange(book, offer, message)),
        Command::Matches => block_on(list_matches()),
        Command::Respond { request, status } => block_on(respond(request, status)),
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
enum Command {
    Run {
        path: Option<String>,
    },
    Demo,
    Login {
        email: String,
    },
    Signup {
        email: String,
        username: String,
    },
    Logout,
    Whoami,
    Books {
        search: Option<String>,
        genre: Option<String>,
    },
    MyBooks,
    AddBook(BookForm),
    Request {
        book: Uuid,
        offer: Uuid,
        message: Option<String>,
    },
    Matches,
    Respond {
        request: Uuid,
        status: ExchangeStatus,
    },
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        return Ok(Command::Run { path: None });
    }

    let arg = |i: usize, what: &str| {
        args.get(i)
            .cloned()
            .ok_or_else(|| anyhow!("Missing {what}\nRun 'bookswap --help' for usage"))
    };

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),
        "--demo" | "demo" => Ok(Command::Demo),
        path if path.starts_with('/') => Ok(Command::Run {
            path: Some(path.to_string()),
        }),

        "login" => Ok(Command::Login {
            email: arg(2, "email")?,
        }),
        "signup" => Ok(Command::Signup {
            email: arg(2, "email")?,
            username: arg(3, "username")?,
        }),
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::Whoami),

        "books" => Ok(Command::Books {
            search: flag(&args, &["--search", "-s"]),
            genre: flag(&args, &["--genre", "-g"]),
        }),
        "my-books" => Ok(Command::MyBooks),
        "add-book" => {
            let condition = my_books::parse_condition(&arg(5, "condition")?).with_context(|| {
                format!(
                    "Expected one of: {}",
                    BookCondition::all()
                        .iter()
                        .map(BookCondition::label)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?;
            Ok(Command::AddBook(BookForm {
                title: arg(2, "title")?,
                author: arg(3, "author")?,
                genre: arg(4, "genre")?,
                condition: Some(condition),
                description: args.get(6).cloned().unwrap_or_default(),
                ..BookForm::default()
            }))
        }

        "request" => {
            let offer = flag(&args, &["--offer", "-o"])
                .ok_or_else(|| anyhow!("Missing --offer <book-id>"))?;
            Ok(Command::Request {
                book: parse_id(&arg(2, "book id")?)?,
                offer: parse_id(&offer)?,
                message: flag(&args, &["--message", "-m"]),
            })
        }
        "matches" => Ok(Command::Matches),
        "accept" => Ok(Command::Respond {
            request: parse_id(&arg(2, "request id")?)?,
            status: ExchangeStatus::Accepted,
        }),
        "reject" => Ok(Command::Respond {
            request: parse_id(&arg(2, "request id")?)?,
            status: ExchangeStatus::Rejected,
        }),

        other => Err(anyhow!(
            "Unknown command: {other}\nRun 'bookswap --help' for usage"
        )),
    }
}

/// Value following any of `names`
fn flag(args: &[String], names: &[&str]) -> Option<String> {
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("Invalid id: {s}"))
}

fn block_on<F: std::future::Future<Output = Result<()>>>(fut: F) -> Result<()> {
    Runtime::new()?.block_on(fut)
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"📚 BookSwap - swap books with fellow readers

USAGE:
    bookswap                                   Launch TUI
    bookswap /<route>                          Launch TUI on a route (/books, /matches, ...)
    bookswap [COMMAND]

COMMANDS:
    demo                                       Launch TUI with sample data
    login <email>                              Sign in (password read from stdin)
    signup <email> <username>                  Create an account
    logout                                     Sign out and forget the session
    whoami                                     Show the signed-in profile

    books [OPTIONS]                            List available books
      Options:
        -s, --search <text>                    Match title or author
        -g, --genre <genre>                    Exact genre
    my-books                                   List your books
    add-book <title> <author> <genre> <condition> [description]
      Conditions: New, "Like New", "Very Good", Good, Fair

    request <book-id> --offer <book-id> [-m <message>]
                                               Ask for a book, offering one of yours
    matches                                    List your exchange requests
    accept <request-id>                        Accept a request for your book
    reject <request-id>                        Reject a request for your book

OPTIONS:
    -h, --help                                 Show this help message
    -v, --version                              Show version information

ENVIRONMENT:
    SUPABASE_URL, SUPABASE_ANON_KEY            Backend connection (override config)
    RUST_LOG                                   Log filter (default: warn)

CONFIG:
    {}
"#,
        config_path
    );
}

fn print_version() {
    println!("bookswap {}", bookswap::VERSION);
}

/// Session store over the configured backend, restored from disk
async fn open_store() -> Result<SessionStore> {
    let config = Config::load()?;
    let connection = config.connection()?;
    let backend = SupabaseClient::new(&connection).context("Failed to build HTTP client")?;
    let mut store = SessionStore::new(Arc::new(backend), SessionVault::open_default()?);
    store.init().await;
    Ok(store)
}

async fn signed_in_store() -> Result<SessionStore> {
    let store = open_store().await?;
    if !store.is_signed_in() {
        bail!("Not signed in. Run: bookswap login <email>");
    }
    Ok(store)
}

fn prompt_password() -> Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

async fn login(email: &str) -> Result<()> {
    let mut store = open_store().await?;
    let credentials = Credentials::Login {
        email: email.to_string(),
        password: prompt_password()?,
    };
    let profile = auth::submit(&mut store, &credentials).await?;
    println!("✓ Signed in as {}", profile.username);
    Ok(())
}

async fn signup(email: &str, username: &str) -> Result<()> {
    let mut store = open_store().await?;
    let credentials = Credentials::SignUp {
        email: email.to_string(),
        password: prompt_password()?,
        username: username.to_string(),
    };
    let profile = auth::submit(&mut store, &credentials).await?;
    println!("✓ Account created. Signed in as {}", profile.username);
    Ok(())
}

async fn logout() -> Result<()> {
    let mut store = open_store().await?;
    if !store.is_signed_in() {
        println!("Not signed in.");
        return Ok(());
    }
    store.sign_out().await?;
    println!("✓ Signed out");
    Ok(())
}

async fn whoami() -> Result<()> {
    let store = open_store().await?;
    let Some(profile) = store.user() else {
        println!("Not signed in.");
        return Ok(());
    };
    println!("👤 {}", profile.username);
    if let Some(email) = store.email() {
        println!("   Email:        {email}");
    }
    println!("   Member since: {}", profile.member_since());
    println!("   Id:           {}", profile.id);
    Ok(())
}

fn print_book(book: &bookswap::Book) {
    println!("\n{}  [{}]", book.title_and_author(), book.status.label());
    println!("   {} · {} · listed {}", book.genre, book.condition, book.listed_on());
    if let Some(description) = &book.description {
        println!("   {description}");
    }
    println!("   id: {}", book.id);
}

async fn list_books(search: Option<String>, genre: Option<String>) -> Result<()> {
    let mut store = signed_in_store().await?;
    let mut view = books::BooksView::new(books::load(&mut store).await);
    view.filter.search = search.unwrap_or_default();
    view.filter.genre = genre;

    println!("📖 {}", view.count_label());
    println!("{}", "─".repeat(60));
    for book in view.visible() {
        print_book(book);
    }
    Ok(())
}

async fn list_my_books() -> Result<()> {
    let mut store = signed_in_store().await?;
    let mine = my_books::load(&mut store).await;
    if mine.is_empty() {
        println!("You haven't listed any books yet.");
        println!("\nAdd one with:");
        println!("  bookswap add-book <title> <author> <genre> <condition>");
        return Ok(());
    }
    println!("📚 My Books ({})", mine.len());
    println!("{}", "─".repeat(60));
    for book in &mine {
        print_book(book);
    }
    Ok(())
}

async fn add_book(form: BookForm) -> Result<()> {
    let mut store = signed_in_store().await?;
    let book = my_books::submit(&mut store, &form).await?;
    println!("✓ Listed \"{}\" ({})", book.title, book.id);
    Ok(())
}

async fn request_exchange(book: Uuid, offer: Uuid, message: Option<String>) -> Result<()> {
    let mut store = signed_in_store().await?;
    let session = store.authorized().await?;
    let requested = store.backend().get_book(&session, book).await?;

    let mut modal = exchange_modal::open(&mut store, requested).await;
    modal.selected = modal.offers.iter().position(|b| b.id == offer);
    if modal.selected.is_none() {
        bail!("Book {offer} is not one of your available books");
    }
    modal.message = message.unwrap_or_default();

    let request = exchange_modal::submit(&mut store, &modal).await?;
    println!(
        "✓ Exchange request sent for \"{}\" ({})",
        modal.requested.title, request.id
    );
    Ok(())
}

async fn list_matches() -> Result<()> {
    let mut store = signed_in_store().await?;
    let me = store.user_id().ok_or_else(|| anyhow!("Not signed in"))?;
    let rows = matches::load(&mut store).await;
    if rows.is_empty() {
        println!("No exchange requests yet.");
        return Ok(());
    }

    println!("🤝 Exchange Requests ({})", rows.len());
    println!("{}", "─".repeat(60));
    for row in &rows {
        let request = &row.request;
        let role = matches::Role::of(request, me).map_or("", |r| r.label());
        println!("\n{} {}  · {}", request.status.emoji(), request.status, role);
        println!("   Requested: {}", row.requested_book.title_and_author());
        println!("   Offered:   {}", row.offered_book.title_and_author());
        if let Some(message) = &request.message {
            println!("   “{message}”");
        }
        if exchange::can_respond(request, me) {
            println!("   bookswap accept {0}  |  bookswap reject {0}", request.id);
        } else {
            println!("   id: {}", request.id);
        }
    }
    Ok(())
}

async fn respond(id: Uuid, status: ExchangeStatus) -> Result<()> {
    let mut store = signed_in_store().await?;
    let rows = matches::load(&mut store).await;
    let request = rows
        .into_iter()
        .map(|r| r.request)
        .find(|r| r.id == id)
        .ok_or_else(|| anyhow!("No exchange request {id} involving you"))?;

    let updated = matches::respond(&mut store, &request, status).await?;
    println!("{} Request {}", updated.status.emoji(), updated.status);
    Ok(())
}

use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use postboard::{
    NewPost, PasswordHash, Profile, User, UserTag, ValidatedPassword, create_user,
    generate_slug, initialize_db, insert_post, upsert_profile,
};

const DEMO_EMAIL: &str = "demo@example.com";
const FRIEND_EMAIL: &str = "friend@example.com";
const DEMO_PASSWORD: &str = "Passw0rd!";
const DEMO_POST_COUNT: i64 = 24;

/// A utility for creating a test database for the postboard server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test users...");
    let now = OffsetDateTime::now_utc();
    let demo = create_account(DEMO_EMAIL, "Demo", "User", now, &conn)?;
    let friend = create_account(FRIEND_EMAIL, "Frankie", "Friend", now, &conn)?;

    println!("Creating {DEMO_POST_COUNT} posts...");
    for number in 1..=DEMO_POST_COUNT {
        let title = format!("Demo post {number}");
        let tagged_users = if number % 3 == 0 {
            vec![UserTag {
                tag_id: Uuid::new_v4().simple().to_string(),
                uid: friend.id,
                first_name: "Frankie".to_owned(),
                last_name: "Friend".to_owned(),
            }]
        } else {
            Vec::new()
        };

        let post = NewPost {
            slug: generate_slug(&title, ""),
            title,
            photo: format!("https://picsum.photos/seed/postboard-{number}/640/480"),
            description: format!("This is demo post number {number}."),
            author_id: demo.id,
            tagged_users,
        };

        // Oldest first so that post 24 is at the top of the feed.
        let created_at = now - Duration::hours(DEMO_POST_COUNT - number);
        insert_post(&post, created_at, &conn)?;
    }

    println!("Success! Log in as {DEMO_EMAIL} with the password {DEMO_PASSWORD:?}.");

    Ok(())
}

fn create_account(
    email: &str,
    first_name: &str,
    last_name: &str,
    now: OffsetDateTime,
    conn: &Connection,
) -> Result<User, Box<dyn Error>> {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(email, password_hash, conn)?;

    upsert_profile(
        &Profile {
            user_id: user.id,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            mobile_no: "0211234567".to_owned(),
            email: user.email.clone(),
            image: String::new(),
            created_at: now,
            updated_at: now,
        },
        conn,
    )?;

    Ok(user)
}

use citadel_csp::directive::{IMG_SRC, SCRIPT_SRC, STYLE_SRC};
use citadel_csp::source::{HashAlgorithm, SCHEME_DATA, SOURCE_SELF};
use citadel_csp::{Policy, PolicyConfig};
use std::error::Error;
use std::sync::Arc;
use std::thread;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // Start from the strict preset and loosen it for this site
    let policy = Arc::new(Policy::try_from_config(&PolicyConfig::strict())?);
    policy.add(IMG_SRC, &[SOURCE_SELF, SCHEME_DATA]);
    policy.add(STYLE_SRC, &[SOURCE_SELF, "https://fonts.example.com"]);

    let inline = HashAlgorithm::Sha256.digest_source(b"console.log('boot')");
    policy.add(SCRIPT_SRC, &[inline.as_str()]);

    println!("Policy configuration:\n{}\n", policy.to_config().to_json()?);

    // Each "request" supplies its own nonce; a real server would draw it from a CSPRNG
    let handles: Vec<_> = ["Zm9vYmFy", "YmF6cXV4", "cXV1eGNvcmdl"]
        .into_iter()
        .map(|nonce| {
            let policy = Arc::clone(&policy);
            thread::spawn(move || {
                let (name, value) = policy.header(Some(nonce));
                format!("{}: {}", name, value)
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok(line) => println!("{}", line),
            Err(_) => eprintln!("request thread panicked"),
        }
    }

    // Forgetting the nonce leaves a visible marker instead of failing
    println!("\nWithout nonce: {}", policy.compile(None));

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use zk_login::circuits::PublicInputsMode;
use zk_login::commands::{compile, derive, prove, setup};

/// Command-line arguments for the zk-login proof tools
#[derive(Parser)]
#[command(name = "zk-login")]
#[command(about = "Generate login proofs from provider-signed tokens")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        default_value = "direct",
        help = "Public input layout: direct or aggregated"
    )]
    mode: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the circuit and print its statistics
    Compile,
    /// Run the Groth16 setup and write the key pair
    Setup {
        #[arg(long, default_value = "build/pk.bin", help = "Output path for the proving key")]
        proving_key: String,
        #[arg(
            long,
            default_value = "build/vk.bin",
            help = "Output path for the verification key"
        )]
        verification_key: String,
    },
    /// Generate a proof from a JSON proof request
    Prove {
        #[arg(short, long, help = "Input JSON file with the proof request")]
        input: String,
        #[arg(long, default_value = "build/pk.bin", help = "Path to the proving key")]
        proving_key: String,
        #[arg(short, long, default_value = "build/proof.b64", help = "Output path for the proof")]
        output: String,
    },
    /// Derive the base64url nonce for an ephemeral key and randomness
    Nonce {
        #[arg(long, help = "Ephemeral public key, hex")]
        eph_pub_key: String,
        #[arg(long, help = "Token randomness, hex")]
        jwt_rnd: String,
    },
    /// Derive the decimal address commitment for raw claim values
    ZkAddr {
        #[arg(long, help = "Raw iss claim value, quotes included")]
        iss: String,
        #[arg(long, help = "Raw aud claim value, quotes included")]
        aud: String,
        #[arg(long, help = "Raw sub claim value, quotes included")]
        sub: String,
        #[arg(long, help = "User salt, hex")]
        user_salt: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mode = match args.mode.as_str() {
        "direct" => PublicInputsMode::Direct,
        "aggregated" => PublicInputsMode::Aggregated,
        other => {
            eprintln!("Invalid mode: {other}. Use 'direct' or 'aggregated'");
            std::process::exit(1);
        }
    };

    match args.command {
        Commands::Compile => compile::compile_circuit(mode)?,
        Commands::Setup {
            proving_key,
            verification_key,
        } => setup::setup_circuit(&proving_key, &verification_key, mode)?,
        Commands::Prove {
            input,
            proving_key,
            output,
        } => prove::generate_proof(&input, &proving_key, &output, mode)?,
        Commands::Nonce {
            eph_pub_key,
            jwt_rnd,
        } => println!("{}", derive::derive_nonce_string(&eph_pub_key, &jwt_rnd)?),
        Commands::ZkAddr {
            iss,
            aud,
            sub,
            user_salt,
        } => println!(
            "{}",
            derive::derive_zk_addr_string(&iss, &aud, &sub, &user_salt)?
        ),
    }

    Ok(())
}

use crate::cli::args::{CliArgs, Command};
use crate::output::OutputFormat;
use crate::view::{SortField, SortOrder};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive integer".to_string());
        }
    }
    if let Some(url) = args.base_url.as_deref() {
        if reqwest::Url::parse(url).is_err() {
            return Err(format!("invalid --base-url '{url}'"));
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }

    if let Command::Users {
        sort,
        order,
        page,
        page_size,
        ..
    } = &args.command
    {
        if let Some(raw) = sort.as_deref() {
            if SortField::parse(raw).is_none() {
                return Err(format!(
                    "invalid --sort '{raw}', expected id, name, email or created"
                ));
            }
        }
        if let Some(raw) = order.as_deref() {
            if SortOrder::parse(raw).is_none() {
                return Err(format!("invalid --order '{raw}', expected asc or desc"));
            }
        }
        if *page == 0 {
            return Err("invalid --page, pages are numbered from 1".to_string());
        }
        if let Some(size) = page_size {
            if *size == 0 {
                return Err("invalid --page-size, expected positive integer".to_string());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn accepts_a_plain_users_invocation() {
        let args = CliArgs::parse_from(["udeck", "users"]);
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn rejects_unknown_sort_field() {
        let args = CliArgs::parse_from(["udeck", "users", "--sort", "age"]);
        assert!(validate(&args).unwrap_err().contains("--sort"));
    }

    #[test]
    fn rejects_page_zero() {
        let args = CliArgs::parse_from(["udeck", "users", "--page", "0"]);
        assert!(validate(&args).unwrap_err().contains("--page"));
    }

    #[test]
    fn rejects_zero_page_size() {
        let args = CliArgs::parse_from(["udeck", "users", "--page-size", "0"]);
        assert!(validate(&args).unwrap_err().contains("--page-size"));
    }

    #[test]
    fn rejects_malformed_base_url() {
        let args = CliArgs::parse_from(["udeck", "-b", "not a url", "status"]);
        assert!(validate(&args).unwrap_err().contains("--base-url"));
    }

    #[test]
    fn rejects_unknown_output_format() {
        let args = CliArgs::parse_from(["udeck", "-f", "xml", "users"]);
        assert!(validate(&args).unwrap_err().contains("--output-format"));
    }
}

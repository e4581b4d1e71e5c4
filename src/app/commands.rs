use crate::config::cli::{Command, CustomerCommand, HotelCommand, ReservationCommand, ShellLine};
use crate::core::service::ReservationService;
use crate::core::{Customer, Hotel, Reservation, Storage};
use crate::domain::model::{CustomerFields, CustomerUpdate, HotelFields, HotelUpdate};
use crate::utils::error::{DeskError, Result};
use clap::Parser;
use std::io::{BufRead, Write};

/// Runs one command against the service and renders its output.
pub fn execute<S: Storage>(service: &ReservationService<S>, command: &Command) -> Result<String> {
    match command {
        Command::Hotel(command) => execute_hotel(service, command),
        Command::Customer(command) => execute_customer(service, command),
        Command::Reservation(command) => execute_reservation(service, command),
        Command::Availability {
            hotel_id,
            start,
            end,
        } => {
            let rooms = service.available_rooms(hotel_id, start, end)?;
            if rooms.is_empty() {
                return Ok(format!("No rooms free in {} from {} to {}", hotel_id, start, end));
            }
            let rooms: Vec<String> = rooms.iter().map(u32::to_string).collect();
            Ok(format!(
                "Free rooms in {} from {} to {}: {}",
                hotel_id,
                start,
                end,
                rooms.join(", ")
            ))
        }
        Command::Check => Ok(render_checks(service)),
        Command::Shell => Ok("Already in the interactive shell".to_string()),
    }
}

fn execute_hotel<S: Storage>(
    service: &ReservationService<S>,
    command: &HotelCommand,
) -> Result<String> {
    match command {
        HotelCommand::Create {
            id,
            name,
            address,
            rooms,
        } => {
            let hotel = service.create_hotel(HotelFields {
                id: id.clone(),
                name: name.clone(),
                address: address.clone(),
                total_rooms: *rooms,
            })?;
            Ok(format!("Hotel created: {}", render_hotel(&hotel)))
        }
        HotelCommand::Update {
            id,
            name,
            address,
            rooms,
        } => {
            let hotel = service.update_hotel(
                id,
                HotelUpdate {
                    name: name.clone(),
                    address: address.clone(),
                    total_rooms: *rooms,
                },
            )?;
            Ok(format!("Hotel updated: {}", render_hotel(&hotel)))
        }
        HotelCommand::Delete { id } => {
            service.delete_hotel(id)?;
            Ok(format!("Hotel {} deleted", id))
        }
        HotelCommand::Show { id } => Ok(render_hotel(&service.show_hotel(id)?)),
        HotelCommand::List => Ok(render_list(service.list_hotels()?, "No hotels", render_hotel)),
    }
}

fn execute_customer<S: Storage>(
    service: &ReservationService<S>,
    command: &CustomerCommand,
) -> Result<String> {
    match command {
        CustomerCommand::Create { id, name, contact } => {
            let customer = service.create_customer(CustomerFields {
                id: id.clone(),
                name: name.clone(),
                contact: contact.clone(),
            })?;
            Ok(format!("Customer created: {}", render_customer(&customer)))
        }
        CustomerCommand::Update { id, name, contact } => {
            let customer = service.update_customer(
                id,
                CustomerUpdate {
                    name: name.clone(),
                    contact: contact.clone(),
                },
            )?;
            Ok(format!("Customer updated: {}", render_customer(&customer)))
        }
        CustomerCommand::Delete { id } => {
            service.delete_customer(id)?;
            Ok(format!("Customer {} deleted", id))
        }
        CustomerCommand::Show { id } => Ok(render_customer(&service.show_customer(id)?)),
        CustomerCommand::List => Ok(render_list(
            service.list_customers()?,
            "No customers",
            render_customer,
        )),
    }
}

fn execute_reservation<S: Storage>(
    service: &ReservationService<S>,
    command: &ReservationCommand,
) -> Result<String> {
    match command {
        ReservationCommand::Create {
            customer,
            hotel,
            room,
            start,
            end,
        } => {
            let reservation = service.create_reservation(customer, hotel, *room, start, end)?;
            Ok(format!("Reservation created: {}", render_reservation(&reservation)))
        }
        ReservationCommand::Cancel { id } => {
            let reservation = service.cancel_reservation(id)?;
            Ok(format!("Reservation cancelled: {}", render_reservation(&reservation)))
        }
        ReservationCommand::Update {
            id,
            room,
            start,
            end,
        } => {
            let reservation = service.update_reservation(id, *room, start, end)?;
            Ok(format!("Reservation updated: {}", render_reservation(&reservation)))
        }
        ReservationCommand::Show { id } => Ok(render_reservation(&service.show_reservation(id)?)),
        ReservationCommand::List => Ok(render_list(
            service.list_reservations()?,
            "No reservations",
            render_reservation,
        )),
    }
}

/// Reads commands line by line until `exit`, `quit` or end of input.
///
/// Every failure, whether a parse error or a rejected operation, is written to
/// `output` and the loop goes on with the next line.
pub fn run_shell<S, R, W>(service: &ReservationService<S>, input: R, mut output: W) -> Result<()>
where
    S: Storage,
    R: BufRead,
    W: Write,
{
    writeln!(output, "front-desk shell. Type `help` for commands, `exit` to leave.")?;

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if matches!(trimmed, "exit" | "quit") {
            break;
        }

        let tokens = match split_line(trimmed) {
            Ok(tokens) => tokens,
            Err(e) => {
                writeln!(output, "❌ {}", e.user_friendly_message())?;
                continue;
            }
        };

        let command = match ShellLine::try_parse_from(&tokens) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // clap 的說明與錯誤都當作輸出，不中斷
                write!(output, "{}", e.render())?;
                continue;
            }
        };

        match execute(service, &command) {
            Ok(rendered) => writeln!(output, "{}", rendered)?,
            Err(e) => {
                tracing::debug!("Command failed: {} (Category: {:?})", e, e.category());
                writeln!(output, "❌ {}", e.user_friendly_message())?;
                writeln!(output, "💡 {}", e.recovery_suggestion())?;
            }
        }
    }

    Ok(())
}

/// Splits a shell line on whitespace, keeping double-quoted text together.
pub fn split_line(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(DeskError::validation("unterminated quote"));
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn render_list<T>(items: Vec<T>, empty: &str, render: fn(&T) -> String) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", render(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_hotel(hotel: &Hotel) -> String {
    let mut rooms: Vec<u32> = hotel.reserved_rooms().iter().map(|r| r.room_number).collect();
    rooms.dedup();
    format!(
        "{} | {} | {} | {} rooms, {} with active reservations",
        hotel.id(),
        hotel.name(),
        hotel.address(),
        hotel.total_rooms(),
        rooms.len()
    )
}

fn render_customer(customer: &Customer) -> String {
    format!("{} | {} | {}", customer.id(), customer.name(), customer.contact())
}

fn render_reservation(reservation: &Reservation) -> String {
    format!(
        "{} | hotel={} | customer={} | room={} | {} -> {} | {}",
        reservation.id(),
        reservation.hotel_id(),
        reservation.customer_id(),
        reservation.room_number(),
        reservation.start_date(),
        reservation.end_date(),
        reservation.status()
    )
}

fn render_checks<S: Storage>(service: &ReservationService<S>) -> String {
    let mut lines = Vec::new();
    for check in service.check_stores() {
        match &check.error {
            Some(error) => {
                lines.push(format!("❌ {} store {}: {}", check.kind, check.location, error))
            }
            None => {
                lines.push(format!(
                    "✅ {} store {}: {} loaded, {} skipped",
                    check.kind,
                    check.location,
                    check.loaded,
                    check.skipped.len()
                ));
                for skipped in &check.skipped {
                    lines.push(format!("   - {}: {}", skipped.key, skipped.reason));
                }
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::core::repository::{Repository, StoreFiles};
    use crate::core::service::DeletePolicy;
    use std::io::Cursor;

    fn service() -> ReservationService<MemoryStorage> {
        let repository = Repository::new(MemoryStorage::new(), &StoreFiles::default());
        ReservationService::new(repository, DeletePolicy::Reject)
    }

    fn run(service: &ReservationService<MemoryStorage>, script: &str) -> String {
        let mut output = Vec::new();
        run_shell(service, Cursor::new(script), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_split_line() {
        assert_eq!(
            split_line(r#"hotel create H1 --name "Gran Hotel" --address Centro"#).unwrap(),
            vec!["hotel", "create", "H1", "--name", "Gran Hotel", "--address", "Centro"]
        );
        assert_eq!(split_line(r#"customer update C1 --contact """#).unwrap().last().unwrap(), "");
        assert!(split_line(r#"hotel show "H1"#).is_err());
    }

    #[test]
    fn test_shell_continues_after_errors() {
        let service = service();
        let script = "\
hotel create H1 --name \"Hotel Uno\" --address Centro --rooms 2
customer create C1 --name Ana --contact ana@example.com
reservation create --customer C1 --hotel H1 --room 1 --start 2024-01-01 --end 2024-01-05
reservation create --customer C1 --hotel H1 --room 1 --start 2024-01-04 --end 2024-01-06
hotel frobnicate
hotel show H9
reservation create --customer C1 --hotel H1 --room 1 --start 2024-01-05 --end 2024-01-06
exit
hotel list
";
        let output = run(&service, script);

        assert!(output.contains("Hotel created: H1 | Hotel Uno"));
        assert!(output.contains("Reservation created: R001"));
        assert!(output.contains("Operation rejected"));
        assert!(output.contains("No hotel with id 'H9' exists"));
        assert!(output.contains("Reservation created: R002"));
        // exit 之後的指令不會執行
        assert!(!output.contains("- H1 |"));
        assert_eq!(service.list_reservations().unwrap().len(), 2);
    }

    #[test]
    fn test_execute_renders_availability() {
        let service = service();
        let create = ShellLine::try_parse_from([
            "hotel", "create", "H1", "--name", "Uno", "--address", "Centro", "--rooms", "3",
        ])
        .unwrap()
        .command;
        execute(&service, &create).unwrap();

        let availability =
            ShellLine::try_parse_from(["availability", "H1", "2024-01-01", "2024-01-02"])
                .unwrap()
                .command;
        assert_eq!(
            execute(&service, &availability).unwrap(),
            "Free rooms in H1 from 2024-01-01 to 2024-01-02: 1, 2, 3"
        );
    }
}
